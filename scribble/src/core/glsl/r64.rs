//! GLSL twins of the double-double kernels
//!
//! Each helper is declared at most once per compiled program through
//! [`GlslContext::declare`](super::GlslContext::declare); the arithmetic
//! matches [`types::double`](crate::types::double) line for line.

use super::GlslContext;

/// Base wrappers; the function-call boundary keeps the driver from fusing
/// the compensated sequences into FMAs
const BASE: &str = "\
float r64_add(float a, float b) { return a + b; }
float r64_sub(float a, float b) { return a - b; }
float r64_mul(float a, float b) { return a * b; }
";

const ADD: &str = "\
vec2 _helper_add_r64(vec2 dsa, vec2 dsb) {
  vec2 dsc;
  float t1, t2, e;
  t1 = r64_add(dsa.x, dsb.x);
  e = r64_sub(t1, dsa.x);
  t2 = r64_add(
    r64_add(r64_sub(dsb.x, e), r64_sub(dsa.x, r64_sub(t1, e))),
    r64_add(dsa.y, dsb.y)
  );
  dsc.x = r64_add(t1, t2);
  dsc.y = r64_sub(t2, r64_sub(dsc.x, t1));
  return dsc;
}
";

const SUB: &str = "\
vec2 _helper_sub_r64(vec2 dsa, vec2 dsb) {
  return _helper_add_r64(dsa, vec2(-dsb.x, -dsb.y));
}
";

const MUL: &str = "\
vec2 _helper_mul_r64(vec2 dsa, vec2 dsb) {
  vec2 dsc;
  float c11, c21, c2, e, t1, t2;
  float a1, a2, b1, b2, cona, conb, split = 8193.;

  cona = r64_mul(dsa.x, split);
  conb = r64_mul(dsb.x, split);
  a1 = r64_sub(cona, r64_sub(cona, dsa.x));
  b1 = r64_sub(conb, r64_sub(conb, dsb.x));
  a2 = r64_sub(dsa.x, a1);
  b2 = r64_sub(dsb.x, b1);

  c11 = r64_mul(dsa.x, dsb.x);
  c21 = r64_add(r64_mul(a2, b2), r64_add(r64_mul(a2, b1), r64_add(r64_mul(a1, b2), r64_sub(r64_mul(a1, b1), c11))));

  c2 = r64_add(r64_mul(dsa.x, dsb.y), r64_mul(dsa.y, dsb.x));

  t1 = r64_add(c11, c2);
  e = r64_sub(t1, c11);
  t2 = r64_add(r64_add(r64_mul(dsa.y, dsb.y), r64_add(r64_sub(c2, e), r64_sub(c11, r64_sub(t1, e)))), c21);

  dsc.x = r64_add(t1, t2);
  dsc.y = r64_sub(t2, r64_sub(dsc.x, t1));

  return dsc;
}
";

const DIV: &str = "\
vec2 _helper_div_r64(vec2 dsa, vec2 dsb) {
  vec2 dsc;
  float t1, t2;
  t1 = dsa.x / dsb.x;
  vec2 p = _helper_mul_r64(dsb, vec2(t1, 0.0));
  vec2 r = _helper_sub_r64(dsa, p);
  t2 = r.x / dsb.x;
  dsc.x = r64_add(t1, t2);
  dsc.y = r64_sub(t2, r64_sub(dsc.x, t1));
  return dsc;
}
";

const CMP: &str = "\
float _helper_cmp_r64(vec2 a, vec2 b) {
  if (a.x < b.x) return -1.0;
  if (a.x > b.x) return 1.0;
  if (a.y < b.y) return -1.0;
  if (a.y > b.y) return 1.0;
  return 0.0;
}
";

const ABS: &str = "\
vec2 _helper_abs_r64(vec2 a) {
  return (a.x < 0.0 || (a.x == 0.0 && a.y < 0.0)) ? vec2(-a.x, -a.y) : a;
}
";

/// Declares the base arithmetic wrappers
pub fn declare_base(ctx: &mut GlslContext) {
    ctx.declare("r64", || BASE.to_string());
}

/// Emits a compensated addition
pub fn add(ctx: &mut GlslContext, a: &str, b: &str) -> String {
    declare_base(ctx);
    ctx.declare("add_r64", || ADD.to_string());
    format!("_helper_add_r64({a}, {b})")
}

/// Emits a compensated subtraction
pub fn sub(ctx: &mut GlslContext, a: &str, b: &str) -> String {
    declare_base(ctx);
    ctx.declare("add_r64", || ADD.to_string());
    ctx.declare("sub_r64", || SUB.to_string());
    format!("_helper_sub_r64({a}, {b})")
}

/// Emits a compensated multiplication
pub fn mul(ctx: &mut GlslContext, a: &str, b: &str) -> String {
    declare_base(ctx);
    ctx.declare("mul_r64", || MUL.to_string());
    format!("_helper_mul_r64({a}, {b})")
}

/// Emits a compensated division
pub fn div(ctx: &mut GlslContext, a: &str, b: &str) -> String {
    declare_base(ctx);
    ctx.declare("add_r64", || ADD.to_string());
    ctx.declare("sub_r64", || SUB.to_string());
    ctx.declare("mul_r64", || MUL.to_string());
    ctx.declare("div_r64", || DIV.to_string());
    format!("_helper_div_r64({a}, {b})")
}

/// Emits a three-way compare producing `-1.0`, `0.0`, or `1.0`
pub fn cmp(ctx: &mut GlslContext, a: &str, b: &str) -> String {
    ctx.declare("cmp_r64", || CMP.to_string());
    format!("_helper_cmp_r64({a}, {b})")
}

/// Emits a compensated absolute value
pub fn abs(ctx: &mut GlslContext, a: &str) -> String {
    ctx.declare("abs_r64", || ABS.to_string());
    format!("_helper_abs_r64({a})")
}
