//! Color construction

use crate::registry::{Entry, Registry};
use crate::types::{Real, TypeName, Val, Value};

use super::real_arg;
use TypeName::{Color, R32};

pub(super) fn register(reg: &mut Registry) {
    // Channels in [0, 1]; alpha is fixed at fully opaque
    reg.insert(
        "rgb",
        Entry::exact(
            &[R32, R32, R32],
            Color,
            Box::new(|args| {
                Ok(Value::Scalar(
                    Color,
                    Val::Color([
                        real_arg(args, 0)?,
                        real_arg(args, 1)?,
                        real_arg(args, 2)?,
                        Real::ONE,
                    ]),
                ))
            }),
            Box::new(|_, args| {
                Ok(format!(
                    "vec4({}, {}, {}, 1.0)",
                    args[0].expr, args[1].expr, args[2].expr
                ))
            }),
        ),
    );
}
