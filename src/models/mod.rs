pub mod appointment;
pub mod billing;
pub mod doctor;
pub mod enums;
pub mod medical_record;
pub mod patient;
pub mod prescription;

pub use appointment::*;
pub use billing::*;
pub use doctor::*;
pub use lab_test::*;
pub use medical_record::*;
pub use patient::*;
pub use prescription::*;
