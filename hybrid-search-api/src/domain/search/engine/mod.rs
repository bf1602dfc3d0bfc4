//! Query engine implementations.

#[cfg(test)]
mod mock;
mod supabase;

#[cfg(test)]
pub use mock::MockQueryEngine;
pub use supabase::SupabaseQueryEngine;
