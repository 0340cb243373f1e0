pub mod event;
pub mod money;
pub mod request;
pub mod response;
pub mod wallet;

pub use event::*;
pub use money::*;
pub use request::*;
pub use response::*;
pub use wallet::*;
