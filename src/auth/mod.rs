//! Identity substitution over `http` requests.
//!
//! - [`Stuntman`]: endpoint dispatcher (sign-in, sign-out, server)
//! - [`BearerValidator`]: `Authorization: Bearer` against persona tokens
//! - [`SessionStrategy`]: host-provided session persistence
//! - [`SelectionRenderer`]: persona picker

pub mod bearer;
pub mod identity;
pub mod picker;
pub mod pipeline;
pub mod request;
pub mod server;
pub mod session;
pub mod signin;
pub mod signout;

pub use bearer::{AuthOutcome, AuthenticationStrategy, BearerValidator};
pub use identity::{Identity, ACCESS_TOKEN_CLAIM_TYPE};
pub use picker::{PersonaListRenderer, SelectionRenderer, SelectionView, StuntmanColor};
pub use pipeline::{error_response, Endpoint, Stuntman};
pub use request::{OVERRIDE_QUERY_KEY, RETURN_URL_QUERY_KEY};
pub use session::{MemorySession, SessionStrategy};
pub use signin::{SignInFlow, SignInOutcome};
pub use signout::SignOutFlow;
