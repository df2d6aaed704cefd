pub mod enums;
pub mod medical_record;
pub mod profile;
pub mod session;

pub use enums::*;
pub use medical_record::*;
pub use profile::*;
pub use session::*;
