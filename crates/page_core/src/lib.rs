//! Client-side behaviour of a personal portfolio page.
//!
//! Two independent controllers operate on an in-memory model of the page:
//! the section tracker (navigation highlight, back-to-top, header chrome,
//! timeline entrance state) and the contact form controller (validation,
//! two outbound email notifications, success banner).

pub mod banner;
pub mod config;
pub mod dom;
pub mod form;
pub mod frame;
pub mod layout;
pub mod nav;
pub mod observer;
pub mod page;
pub mod reveal;
pub mod submission;
pub mod timeline;
pub mod tracker;
pub mod transport;

pub use config::{load_settings, Settings};
pub use dom::{Document, Element, NodeId, Rect};
pub use page::{PageState, PortfolioPage, SharedPage};
pub use submission::{FormController, SubmissionReport, SubmitError, SubmitPolicy};
pub use tracker::{
    compute_active_section, should_show_back_to_top, update_header_chrome, ChromeState, Section,
};
pub use transport::{build_transport, EmailJsTransport, MissingTransport, NotificationTransport};
