#[allow(unused_imports)]
pub use itertools::Itertools;
#[allow(unused_imports)]
pub use num_traits;

#[allow(unused_imports)]
pub use anyhow::{anyhow, bail, Context, Result};
#[allow(unused_imports)]
pub use tracing::{error, info, warn};

#[allow(unused_imports)]
pub use crate::{
    core::{
        config::*,
        event::{OperationEvent, OperationKind, VectorUpdate},
    },
    util::{
        assert::*,
        colour::Colour,
        linalg,
        linalg::{Matrix, MatrixSize, OpResult, Value, Vec2, Vec3},
        UniqueShared,
    },
};
