mod html;
mod pdf;
mod renderer;
mod template;
mod waypoint_csv;

pub use pdf::{PdfConverter, Wkhtmltopdf};
pub use renderer::{RenderError, render_report};
pub use template::Template;
pub use waypoint_csv::render_waypoint_csv;

#[cfg(test)]
pub use renderer::tests::EchoConverter;
