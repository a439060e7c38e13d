// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation entities and the per-image store.

pub mod annotation;
pub mod store;
