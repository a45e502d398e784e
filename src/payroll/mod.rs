//! Salary slip generation and correction.
//!
//! [`runner`] creates one slip per employee per pay period inside a single
//! store transaction; [`slips`] reads and corrects existing slips. Both go
//! through [`calculator`] for net pay.

pub mod calculator;
pub mod runner;
pub mod slips;
