// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! I/O operations for image datasets and annotation records.

pub mod media;
pub mod serialization;
