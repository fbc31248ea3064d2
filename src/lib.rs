//! cfadmin: crowdfunding admin console
//!
//! Moderates campaigns and payout requests and maintains the reference data
//! (banks, languages, translations) of a crowdfunding platform. Every list
//! view runs the same filter, search, sort and paginate pipeline over a
//! [`core::DataSource`].

pub mod cli;
pub mod core;
pub mod entities;
pub mod json;
pub mod pipeline;
