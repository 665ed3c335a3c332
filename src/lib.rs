mod bytes;

pub mod common;
pub use common::{Color, Dimensions, Era, Player, Side};

pub mod pud;
pub use pud::{CheckError, OpenMode, Pud, PudError, Section, Unit};

pub mod war;
pub use war::{Archive, WarError};

pub mod error;
pub use error::W2Error;
pub use error::Result;
