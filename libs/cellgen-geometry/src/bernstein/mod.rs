//! # Bernstein Polynomials
//!
//! Univariate and tensor-product bivariate polynomials in Bernstein form
//! over the unit interval / unit square.
//!
//! ## Overview
//!
//! The Bernstein basis gives two properties the solvers rely on:
//! - the graph lies in the convex hull of the control points `(i/n, c_i)`,
//!   so `min c_i` is a lower bound of the polynomial;
//! - restriction to a sub-interval is a de Casteljau subdivision.
//!
//! Arithmetic elevates operands to a common degree where needed.

use std::ops::{Add, Mul, Neg, Sub};

// =============================================================================
// BINOMIALS
// =============================================================================

/// Binomial coefficient as `f64`.
///
/// # Examples
/// ```
/// use cellgen_geometry::bernstein::binomial;
/// assert_eq!(binomial(6, 3), 20.0);
/// assert_eq!(binomial(4, 0), 1.0);
/// ```
pub fn binomial(n: usize, k: usize) -> f64 {
    if k > n {
        return 0.0;
    }
    let k = k.min(n - k);
    let mut acc = 1.0;
    for i in 0..k {
        acc = acc * (n - i) as f64 / (i + 1) as f64;
    }
    acc
}

// =============================================================================
// UNIVARIATE
// =============================================================================

/// Univariate polynomial in Bernstein form over `[0, 1]`.
///
/// # Examples
/// ```
/// use cellgen_geometry::Bernstein1;
/// // p(t) = t in degree 1 is [0, 1]
/// let t = Bernstein1::new(vec![0.0, 1.0]);
/// let p = &t * &t; // t²
/// assert_eq!(p.degree(), 2);
/// assert!((p.eval(0.5) - 0.25).abs() < 1e-15);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Bernstein1 {
    coeffs: Vec<f64>,
}

impl Bernstein1 {
    /// Creates a polynomial from its Bernstein coefficients.
    ///
    /// An empty coefficient list is the zero polynomial of degree zero.
    pub fn new(coeffs: Vec<f64>) -> Self {
        if coeffs.is_empty() {
            return Self::constant(0.0);
        }
        Self { coeffs }
    }

    /// Constant polynomial.
    pub fn constant(c: f64) -> Self {
        Self { coeffs: vec![c] }
    }

    /// Linear polynomial interpolating `a` at 0 and `b` at 1.
    pub fn linear(a: f64, b: f64) -> Self {
        Self { coeffs: vec![a, b] }
    }

    /// Converts power-basis coefficients `Σ a_k t^k` to Bernstein form.
    ///
    /// # Examples
    /// ```
    /// use cellgen_geometry::Bernstein1;
    /// let p = Bernstein1::from_power(&[1.0, -3.0, 2.0]); // 1 - 3t + 2t²
    /// assert!((p.eval(0.5) - 0.0).abs() < 1e-12);
    /// ```
    pub fn from_power(power: &[f64]) -> Self {
        if power.is_empty() {
            return Self::constant(0.0);
        }
        let n = power.len() - 1;
        let coeffs = (0..=n)
            .map(|i| {
                (0..=i)
                    .map(|k| binomial(i, k) / binomial(n, k) * power[k])
                    .sum()
            })
            .collect();
        Self { coeffs }
    }

    /// Polynomial degree.
    #[inline]
    pub fn degree(&self) -> usize {
        self.coeffs.len() - 1
    }

    /// Bernstein coefficients.
    #[inline]
    pub fn coeffs(&self) -> &[f64] {
        &self.coeffs
    }

    /// Evaluates with de Casteljau's algorithm.
    pub fn eval(&self, t: f64) -> f64 {
        let mut c = self.coeffs.clone();
        let n = c.len();
        for level in 1..n {
            for i in 0..n - level {
                c[i] = c[i] + (c[i + 1] - c[i]) * t;
            }
        }
        c[0]
    }

    /// Smallest coefficient, a lower bound on `[0, 1]`.
    pub fn min_coeff(&self) -> f64 {
        self.coeffs.iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// Largest coefficient, an upper bound on `[0, 1]`.
    pub fn max_coeff(&self) -> f64 {
        self.coeffs.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Largest absolute coefficient.
    pub fn max_abs(&self) -> f64 {
        self.coeffs.iter().fold(0.0, |m, c| m.max(c.abs()))
    }

    /// Returns true if every coefficient is within `tol` of zero.
    pub fn is_zero(&self, tol: f64) -> bool {
        self.max_abs() <= tol
    }

    /// Derivative, of degree `n - 1` (degree zero stays degree zero).
    pub fn derivative(&self) -> Self {
        let n = self.degree();
        if n == 0 {
            return Self::constant(0.0);
        }
        let scale = n as f64;
        Self {
            coeffs: self.coeffs.windows(2).map(|w| (w[1] - w[0]) * scale).collect(),
        }
    }

    /// Degree elevation by one.
    pub fn elevate(&self) -> Self {
        let n = self.degree();
        let m = (n + 1) as f64;
        let mut coeffs = Vec::with_capacity(n + 2);
        coeffs.push(self.coeffs[0]);
        for i in 1..=n {
            let a = i as f64 / m;
            coeffs.push(a * self.coeffs[i - 1] + (1.0 - a) * self.coeffs[i]);
        }
        coeffs.push(self.coeffs[n]);
        Self { coeffs }
    }

    /// Degree elevation to `degree`; no-op if already at least that high.
    pub fn elevate_to(&self, degree: usize) -> Self {
        let mut p = self.clone();
        while p.degree() < degree {
            p = p.elevate();
        }
        p
    }

    /// Splits at `t` into the polynomials over `[0, t]` and `[t, 1]`,
    /// both reparametrized to `[0, 1]`.
    pub fn subdivide(&self, t: f64) -> (Self, Self) {
        let n = self.coeffs.len();
        let mut c = self.coeffs.clone();
        let mut left = Vec::with_capacity(n);
        let mut right = Vec::with_capacity(n);
        left.push(c[0]);
        right.push(c[n - 1]);
        for level in 1..n {
            for i in 0..n - level {
                c[i] = c[i] + (c[i + 1] - c[i]) * t;
            }
            left.push(c[0]);
            right.push(c[n - 1 - level]);
        }
        right.reverse();
        (Self { coeffs: left }, Self { coeffs: right })
    }

    /// Restriction to `[a, b] ⊂ [0, 1]`, reparametrized to `[0, 1]`.
    ///
    /// # Examples
    /// ```
    /// use cellgen_geometry::Bernstein1;
    /// let p = Bernstein1::from_power(&[0.0, 0.0, 1.0]); // t²
    /// let q = p.restrict(0.5, 1.0);
    /// assert!((q.eval(0.0) - 0.25).abs() < 1e-12);
    /// assert!((q.eval(1.0) - 1.0).abs() < 1e-12);
    /// ```
    pub fn restrict(&self, a: f64, b: f64) -> Self {
        if b >= 1.0 {
            return self.subdivide(a).1;
        }
        let (left, _) = self.subdivide(b);
        if a <= 0.0 {
            return left;
        }
        left.subdivide(a / b).1
    }

    /// Multiplies all coefficients by `s`.
    pub fn scale(&self, s: f64) -> Self {
        Self {
            coeffs: self.coeffs.iter().map(|c| c * s).collect(),
        }
    }
}

impl Add for &Bernstein1 {
    type Output = Bernstein1;

    fn add(self, rhs: Self) -> Bernstein1 {
        let n = self.degree().max(rhs.degree());
        let a = self.elevate_to(n);
        let b = rhs.elevate_to(n);
        Bernstein1 {
            coeffs: a.coeffs.iter().zip(&b.coeffs).map(|(x, y)| x + y).collect(),
        }
    }
}

impl Sub for &Bernstein1 {
    type Output = Bernstein1;

    fn sub(self, rhs: Self) -> Bernstein1 {
        self + &(-rhs)
    }
}

impl Neg for &Bernstein1 {
    type Output = Bernstein1;

    fn neg(self) -> Bernstein1 {
        self.scale(-1.0)
    }
}

impl Mul for &Bernstein1 {
    type Output = Bernstein1;

    fn mul(self, rhs: Self) -> Bernstein1 {
        let m = self.degree();
        let n = rhs.degree();
        let mut coeffs = vec![0.0; m + n + 1];
        for (i, a) in self.coeffs.iter().enumerate() {
            let wa = binomial(m, i);
            for (j, b) in rhs.coeffs.iter().enumerate() {
                coeffs[i + j] += wa * binomial(n, j) * a * b;
            }
        }
        for (k, c) in coeffs.iter_mut().enumerate() {
            *c /= binomial(m + n, k);
        }
        Bernstein1 { coeffs }
    }
}

// =============================================================================
// BIVARIATE
// =============================================================================

/// Tensor-product polynomial in Bernstein form over `[0, 1]²`.
///
/// Coefficient `(i, j)` multiplies `B_i^m(u) B_j^n(v)` and is stored at
/// `i * (n + 1) + j`.
///
/// # Examples
/// ```
/// use cellgen_geometry::{Bernstein1, Bernstein2};
/// let u = Bernstein1::linear(0.0, 1.0);
/// let v = Bernstein1::linear(0.0, 2.0);
/// let p = Bernstein2::outer(&u, &v); // 2uv
/// assert!((p.eval(0.5, 0.5) - 0.5).abs() < 1e-15);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Bernstein2 {
    deg_u: usize,
    deg_v: usize,
    coeffs: Vec<f64>,
}

impl Bernstein2 {
    /// Creates a polynomial from row-major coefficients.
    ///
    /// Returns `None` if the coefficient count does not match the degrees.
    pub fn new(deg_u: usize, deg_v: usize, coeffs: Vec<f64>) -> Option<Self> {
        ((deg_u + 1) * (deg_v + 1) == coeffs.len()).then_some(Self { deg_u, deg_v, coeffs })
    }

    /// Constant polynomial.
    pub fn constant(c: f64) -> Self {
        Self {
            deg_u: 0,
            deg_v: 0,
            coeffs: vec![c],
        }
    }

    /// Product `p(u) · q(v)`.
    pub fn outer(p: &Bernstein1, q: &Bernstein1) -> Self {
        let coeffs = p
            .coeffs()
            .iter()
            .flat_map(|a| q.coeffs().iter().map(move |b| a * b))
            .collect();
        Self {
            deg_u: p.degree(),
            deg_v: q.degree(),
            coeffs,
        }
    }

    /// Polynomial depending on `u` only.
    pub fn from_u(p: &Bernstein1) -> Self {
        Self::outer(p, &Bernstein1::constant(1.0))
    }

    /// Polynomial depending on `v` only.
    pub fn from_v(q: &Bernstein1) -> Self {
        Self::outer(&Bernstein1::constant(1.0), q)
    }

    /// Degrees `(m, n)` in `u` and `v`.
    pub fn degrees(&self) -> (usize, usize) {
        (self.deg_u, self.deg_v)
    }

    /// Coefficient `(i, j)`.
    #[inline]
    pub fn coeff(&self, i: usize, j: usize) -> f64 {
        self.coeffs[i * (self.deg_v + 1) + j]
    }

    /// Row-major coefficients.
    pub fn coeffs(&self) -> &[f64] {
        &self.coeffs
    }

    /// Smallest coefficient, a lower bound on `[0, 1]²`.
    pub fn min_coeff(&self) -> f64 {
        self.coeffs.iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// Largest absolute coefficient.
    pub fn max_abs(&self) -> f64 {
        self.coeffs.iter().fold(0.0, |m, c| m.max(c.abs()))
    }

    /// Row `i`: coefficients along `v` for fixed `u` index.
    fn row(&self, i: usize) -> Bernstein1 {
        let w = self.deg_v + 1;
        Bernstein1::new(self.coeffs[i * w..(i + 1) * w].to_vec())
    }

    /// Column `j`: coefficients along `u` for fixed `v` index.
    fn column(&self, j: usize) -> Bernstein1 {
        Bernstein1::new((0..=self.deg_u).map(|i| self.coeff(i, j)).collect())
    }

    fn from_rows(deg_v: usize, rows: &[Bernstein1]) -> Self {
        let coeffs = rows.iter().flat_map(|r| r.coeffs().iter().copied()).collect();
        Self {
            deg_u: rows.len() - 1,
            deg_v,
            coeffs,
        }
    }

    fn from_columns(deg_u: usize, columns: &[Bernstein1]) -> Self {
        let deg_v = columns.len() - 1;
        let mut coeffs = vec![0.0; (deg_u + 1) * (deg_v + 1)];
        for (j, col) in columns.iter().enumerate() {
            for (i, c) in col.coeffs().iter().enumerate() {
                coeffs[i * (deg_v + 1) + j] = *c;
            }
        }
        Self { deg_u, deg_v, coeffs }
    }

    /// Evaluates at `(u, v)`.
    pub fn eval(&self, u: f64, v: f64) -> f64 {
        let along_u: Vec<f64> = (0..=self.deg_u).map(|i| self.row(i).eval(v)).collect();
        Bernstein1::new(along_u).eval(u)
    }

    /// Restriction to the line `u = u0`, as a polynomial in `v`.
    pub fn at_u(&self, u0: f64) -> Bernstein1 {
        let coeffs = (0..=self.deg_v).map(|j| self.column(j).eval(u0)).collect();
        Bernstein1::new(coeffs)
    }

    /// Restriction to the line `v = v0`, as a polynomial in `u`.
    pub fn at_v(&self, v0: f64) -> Bernstein1 {
        let coeffs = (0..=self.deg_u).map(|i| self.row(i).eval(v0)).collect();
        Bernstein1::new(coeffs)
    }

    /// Partial derivative in `u`.
    pub fn derivative_u(&self) -> Self {
        let cols: Vec<Bernstein1> = (0..=self.deg_v).map(|j| self.column(j).derivative()).collect();
        Self::from_columns(cols[0].degree(), &cols)
    }

    /// Partial derivative in `v`.
    pub fn derivative_v(&self) -> Self {
        let rows: Vec<Bernstein1> = (0..=self.deg_u).map(|i| self.row(i).derivative()).collect();
        Self::from_rows(rows[0].degree(), &rows)
    }

    /// Elevates to degrees at least `(m, n)`.
    pub fn elevate_to(&self, m: usize, n: usize) -> Self {
        let rows: Vec<Bernstein1> = (0..=self.deg_u).map(|i| self.row(i).elevate_to(n)).collect();
        let tmp = Self::from_rows(rows[0].degree(), &rows);
        let cols: Vec<Bernstein1> = (0..=tmp.deg_v).map(|j| tmp.column(j).elevate_to(m)).collect();
        Self::from_columns(cols[0].degree(), &cols)
    }

    /// Restriction to `[u0, u1] × [v0, v1]`, reparametrized to the unit square.
    pub fn restrict(&self, u0: f64, u1: f64, v0: f64, v1: f64) -> Self {
        let rows: Vec<Bernstein1> = (0..=self.deg_u).map(|i| self.row(i).restrict(v0, v1)).collect();
        let tmp = Self::from_rows(self.deg_v, &rows);
        let cols: Vec<Bernstein1> = (0..=self.deg_v).map(|j| tmp.column(j).restrict(u0, u1)).collect();
        Self::from_columns(self.deg_u, &cols)
    }

    /// Multiplies all coefficients by `s`.
    pub fn scale(&self, s: f64) -> Self {
        Self {
            deg_u: self.deg_u,
            deg_v: self.deg_v,
            coeffs: self.coeffs.iter().map(|c| c * s).collect(),
        }
    }
}

impl Add for &Bernstein2 {
    type Output = Bernstein2;

    fn add(self, rhs: Self) -> Bernstein2 {
        let m = self.deg_u.max(rhs.deg_u);
        let n = self.deg_v.max(rhs.deg_v);
        let a = self.elevate_to(m, n);
        let b = rhs.elevate_to(m, n);
        Bernstein2 {
            deg_u: m,
            deg_v: n,
            coeffs: a.coeffs.iter().zip(&b.coeffs).map(|(x, y)| x + y).collect(),
        }
    }
}

impl Sub for &Bernstein2 {
    type Output = Bernstein2;

    fn sub(self, rhs: Self) -> Bernstein2 {
        self + &rhs.scale(-1.0)
    }
}
