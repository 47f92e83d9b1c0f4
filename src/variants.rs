//! Concrete model parameter types.
pub use self::linear::LinearParameters;
pub use self::lwr::LwrParameters;
pub use self::rbfn::RbfnParameters;

mod linear;
mod lwr;
mod rbfn;
