// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Coordinate transforms and curve sampling.

pub mod geometry;
pub mod spline;
