pub mod assignments;

pub mod review_mappings;

pub use assignments::configure_assignments_routes;
pub use review_mappings::configure_review_mappings_routes;
