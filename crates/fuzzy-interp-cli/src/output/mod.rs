//! Output formatting for CLI commands.

mod diagnostic;
pub mod table;

pub use diagnostic::CatalogDiagnostic;

use fuzzy_interp::RatingClass;
use owo_colors::{OwoColorize, Stream};

/// A rating to three decimals, or `not rated`.
pub fn format_rating(rating: Option<f64>) -> String {
    match rating {
        Some(r) => format!("{r:.3}"),
        None => "not rated".to_string(),
    }
}

/// The class label, colored by severity when stdout supports it.
pub fn paint_class(class: RatingClass) -> String {
    let label = class.label();
    match class {
        RatingClass::NotRated => label.if_supports_color(Stream::Stdout, |t| t.dimmed()).to_string(),
        RatingClass::Slight => label.if_supports_color(Stream::Stdout, |t| t.green()).to_string(),
        RatingClass::Moderate => label.if_supports_color(Stream::Stdout, |t| t.yellow()).to_string(),
        RatingClass::Severe => label.if_supports_color(Stream::Stdout, |t| t.red()).to_string(),
        RatingClass::VerySevere => label
            .if_supports_color(Stream::Stdout, |t| t.bright_red())
            .to_string(),
    }
}
