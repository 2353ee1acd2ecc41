//! Interactive paging over a single persistent chat message
//!
//! A page owns the components rendered into one message and reacts to the
//! interactions the host delivers for them. Pages switch between each other,
//! nest into parent/child menus, and time out when left alone.
//!
//! ```text
//! ┌────────┐  Interaction   ┌─────────┐   callback   ┌──────┐
//! │  Host  │ ─────────────▶ │ Surface │ ───────────▶ │ Page │
//! └────────┘                └─────────┘              └──────┘
//!      ▲                                                 │
//!      └──────────────── edit_message ◀──── render ◀─────┘
//! ```

pub mod config;
pub mod error;
pub mod host;
pub mod logging;
pub mod page;
pub mod util;

#[cfg(test)]
mod testing;

pub use error::{PageError, PageResult};
pub use host::{Context, Host, Interaction, RenderTarget, Surface};
pub use page::{Page, PageBuilder, PageCore, PageKind};
