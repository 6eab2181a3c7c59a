//! Built-in sniffers for the servlet, REST and static HTML specifications.

pub mod html;
pub mod rest;
pub mod servlet;

pub use html::HtmlSniffer;
pub use rest::RestSniffer;
pub use servlet::ServletSniffer;
