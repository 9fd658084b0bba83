//! Vectors, matrices, and linear algebra
//!
//! Componentwise operations stay exact through the rational kernels;
//! determinants go through `nalgebra` at floating precision and are always
//! approximate.  None of these types has a shader representation, so every
//! emit rule reports the construct as unsupported there.

use crate::registry::{EmitFn, Entry, Registry};
use crate::types::{real, Mat, Real, TypeName, Val, Value};
use crate::{Backend, Error};

use super::{matrix_arg, real_arg, vector_arg};
use TypeName::{Matrix, Vector, R64};

fn no_shader() -> EmitFn {
    Box::new(|_, _| {
        Err(Error::unsupported("vectors and matrices", Backend::Shader))
    })
}

fn dim_mismatch(what: &str) -> Error {
    Error::Domain(format!("{what} dimensions do not match"))
}

pub(super) fn register(reg: &mut Registry) {
    reg.insert(
        "vector",
        Entry::variadic(
            1,
            R64,
            Vector,
            Box::new(|args| {
                let items = (0..args.len())
                    .map(|i| real_arg(args, i))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::Scalar(Vector, Val::Vector(items)))
            }),
            no_shader(),
        ),
    );

    // Columns into a matrix
    reg.insert(
        "matrix",
        Entry::variadic(
            1,
            Vector,
            Matrix,
            Box::new(|args| {
                let cols = (0..args.len())
                    .map(|i| vector_arg(args, i))
                    .collect::<Result<Vec<_>, _>>()?;
                let rows = cols[0].len();
                if cols.iter().any(|c| c.len() != rows) {
                    return Err(dim_mismatch("column"));
                }
                let mut data = Vec::with_capacity(rows * cols.len());
                for r in 0..rows {
                    for c in &cols {
                        data.push(c[r]);
                    }
                }
                Ok(Value::Scalar(
                    Matrix,
                    Val::Matrix(Mat::new(rows, cols.len(), data)),
                ))
            }),
            no_shader(),
        ),
    );

    reg.insert(
        "+",
        Entry::exact(
            &[Vector, Vector],
            Vector,
            Box::new(|args| {
                let a = vector_arg(args, 0)?;
                let b = vector_arg(args, 1)?;
                if a.len() != b.len() {
                    return Err(dim_mismatch("vector"));
                }
                let sum =
                    a.iter().zip(b).map(|(&x, &y)| real::add(x, y)).collect();
                Ok(Value::Scalar(Vector, Val::Vector(sum)))
            }),
            no_shader(),
        ),
    );
    reg.insert(
        "+",
        Entry::exact(
            &[Matrix, Matrix],
            Matrix,
            Box::new(|args| {
                let a = matrix_arg(args, 0)?;
                let b = matrix_arg(args, 1)?;
                if a.rows != b.rows || a.cols != b.cols {
                    return Err(dim_mismatch("matrix"));
                }
                let data = a
                    .data
                    .iter()
                    .zip(&b.data)
                    .map(|(&x, &y)| real::add(x, y))
                    .collect();
                Ok(Value::Scalar(
                    Matrix,
                    Val::Matrix(Mat::new(a.rows, a.cols, data)),
                ))
            }),
            no_shader(),
        ),
    );

    // Dot product; registered ahead of the matrix product so that two
    // vectors resolve here instead of widening to one-column matrices
    reg.insert(
        "·",
        Entry::exact(
            &[Vector, Vector],
            R64,
            Box::new(|args| {
                let a = vector_arg(args, 0)?;
                let b = vector_arg(args, 1)?;
                if a.len() != b.len() {
                    return Err(dim_mismatch("vector"));
                }
                let dot = a.iter().zip(b).fold(Real::ZERO, |acc, (&x, &y)| {
                    real::add(acc, real::mul(x, y))
                });
                Ok(Value::real(dot))
            }),
            no_shader(),
        ),
    );
    reg.insert(
        "·",
        Entry::exact(
            &[R64, Vector],
            Vector,
            Box::new(|args| {
                let s = real_arg(args, 0)?;
                let v = vector_arg(args, 1)?;
                let scaled = v.iter().map(|&x| real::mul(s, x)).collect();
                Ok(Value::Scalar(Vector, Val::Vector(scaled)))
            }),
            no_shader(),
        ),
    );
    reg.insert(
        "·",
        Entry::exact(
            &[Matrix, Matrix],
            Matrix,
            Box::new(|args| {
                let a = matrix_arg(args, 0)?;
                let b = matrix_arg(args, 1)?;
                if a.cols != b.rows {
                    return Err(dim_mismatch("matrix"));
                }
                let mut data = Vec::with_capacity(a.rows * b.cols);
                for r in 0..a.rows {
                    for c in 0..b.cols {
                        let mut acc = Real::ZERO;
                        for k in 0..a.cols {
                            acc = real::add(
                                acc,
                                real::mul(
                                    a.data[r * a.cols + k],
                                    b.data[k * b.cols + c],
                                ),
                            );
                        }
                        data.push(acc);
                    }
                }
                Ok(Value::Scalar(
                    Matrix,
                    Val::Matrix(Mat::new(a.rows, b.cols, data)),
                ))
            }),
            no_shader(),
        ),
    );

    reg.insert(
        "det",
        Entry::exact(
            &[Matrix],
            R64,
            Box::new(|args| {
                let m = matrix_arg(args, 0)?;
                if m.rows != m.cols {
                    return Err(Error::Domain(format!(
                        "cannot take the determinant of a {}×{} matrix",
                        m.rows, m.cols
                    )));
                }
                let data: Vec<f64> =
                    m.data.iter().map(Real::to_f64).collect();
                let d = nalgebra::DMatrix::from_row_slice(
                    m.rows, m.cols, &data,
                )
                .determinant();
                Ok(Value::real(Real::approx(d)))
            }),
            no_shader(),
        ),
    );

    reg.insert(
        "transpose",
        Entry::exact(
            &[Matrix],
            Matrix,
            Box::new(|args| {
                let m = matrix_arg(args, 0)?;
                let mut data = Vec::with_capacity(m.data.len());
                for c in 0..m.cols {
                    for r in 0..m.rows {
                        data.push(m.data[r * m.cols + c]);
                    }
                }
                Ok(Value::Scalar(
                    Matrix,
                    Val::Matrix(Mat::new(m.cols, m.rows, data)),
                ))
            }),
            no_shader(),
        ),
    );
}
