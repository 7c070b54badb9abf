// Text measurement and paragraph layout for the declaration page.

pub mod font_metrics;
pub mod justify;
