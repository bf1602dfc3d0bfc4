//! Minimal client for calling Postgres functions exposed by a Supabase
//! (PostgREST) project through `POST /rest/v1/rpc/<function>`.

mod client;
mod credentials;
mod rpc_url;

pub(crate) use rpc_url::*;

pub use client::*;
pub use credentials::*;
