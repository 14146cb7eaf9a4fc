//! Browsing context passed into each resolution

/// The profile or window a query is typed into.
pub trait BrowsingContext {
    /// Private contexts never record visits.
    fn is_private(&self) -> bool;
}
