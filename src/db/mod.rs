//! # Database Module
//!
//! This module organizes all database-related code into submodules:
//! - `models`: Data structures (Category, Product, User)
//! - `categories`: Category queries, including the per-request navigation list
//! - `products`: Product queries
//! - `users`: CRUD operations for users

pub mod categories;
pub mod models;
pub mod products;
pub mod users;
