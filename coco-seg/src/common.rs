pub use anyhow::{ensure, format_err, Context as _, Error, Result};
pub use indexmap::{IndexMap, IndexSet};
pub use itertools::Itertools as _;
pub use log::{debug, info};
pub use ndarray::{s, Array2, Array3, Array4, ArrayView2, ArrayViewMut2, Zip};
pub use rand::prelude::*;
pub use serde::{Deserialize, Serialize};
pub use std::{
    collections::HashMap,
    fmt::Debug,
    fs,
    fs::File,
    io::BufReader,
    iter,
    path::{Path, PathBuf},
};
