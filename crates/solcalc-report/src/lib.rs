// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod export;
pub mod json;
pub mod money;
pub mod proposal;

pub use export::*;
pub use json::*;
pub use money::*;
pub use proposal::*;
