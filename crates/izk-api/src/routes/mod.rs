//! # Route Modules
//!
//! | Route                        | Module      |
//! |------------------------------|-------------|
//! | `POST /v1/income/classify`   | [`income`]  |
//! | `POST /v1/income/verify`     | [`income`]  |
//! | `GET /v1/circuit`            | [`circuit`] |

pub mod circuit;
pub mod income;
