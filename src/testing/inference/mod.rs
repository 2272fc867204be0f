//! Two-sample tests used to rank genes one cluster against the rest.

pub mod nonparametric;

pub mod parametric;
