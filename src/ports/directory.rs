//! Directory port for read-only identity lookups.

/// Searches an identity directory.
///
/// Implementations hold one connection for their whole lifetime and search
/// a fixed base with subtree scope.
pub trait Directory: Send + Sync {
    /// Establishes the connection ahead of the first search.
    ///
    /// # Errors
    ///
    /// Returns an error if the server is unreachable or rejects the bind.
    fn connect(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }

    /// Returns the identifier of every entry matching `filter`.
    ///
    /// A search without matches yields an empty vector, not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the query cannot be executed.
    fn search(&self, filter: &str) -> Result<Vec<String>, Box<dyn std::error::Error + Send + Sync>>;
}
