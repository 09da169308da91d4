pub mod actuator;
pub mod crop;
pub mod decision;
pub mod greenhouse;
pub mod sensor;

pub use actuator::*;
pub use crop::*;
pub use decision::*;
pub use greenhouse::*;
pub use sensor::*;
