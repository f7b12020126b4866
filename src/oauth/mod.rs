pub mod authorize;
pub mod callback;
pub mod credentials;
pub mod state;
pub mod token;

pub use authorize::build_authorization_url;
pub use callback::{listen_for_callback, redirect_port, serve_callback, CallbackHandler, CLOSE_WINDOW_HTML};
pub use credentials::get_credentials;
pub use state::{pack_state, parse_state};
pub use token::{access_token, exchange_code};
