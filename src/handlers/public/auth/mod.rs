// handlers/public/auth - token acquisition and renewal

pub mod login;
pub mod refresh;
pub mod session;
pub mod utils;

pub use login::post as login_post;
pub use refresh::post as refresh_post;
pub use session::logout as logout_post;
