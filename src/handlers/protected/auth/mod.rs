pub mod session;

pub use session::me as me_get;
