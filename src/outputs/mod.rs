//! Output generation: the HTML digest file and the optional e-mail copy.
//!
//! # Submodules
//!
//! - [`html`]: Renders summaries into one static page and writes it to disk
//! - [`mail`]: Sends an already rendered page over SMTP
//!
//! # Output
//!
//! ```text
//! <working dir>/
//! └── index.html   # replaced on every successful run
//! ```

pub mod html;
pub mod mail;
