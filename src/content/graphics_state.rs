//! Graphics and text state for content stream interpretation.
//!
//! Only the parameters that move glyphs are tracked. Colors, line styles and
//! transparency never change where a token ends up, so they are ignored.

use crate::geometry::{Point, Rect};

/// A 2D transformation matrix.
///
/// PDF uses matrices of the form:
/// ```text
/// [ a  b  0 ]
/// [ c  d  0 ]
/// [ e  f  1 ]
/// ```
///
/// Where (a,b,c,d) define scaling/rotation/skewing and (e,f) define translation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    /// Horizontal scaling component
    pub a: f32,
    /// Rotation/skew component
    pub b: f32,
    /// Rotation/skew component
    pub c: f32,
    /// Vertical scaling component
    pub d: f32,
    /// Horizontal translation
    pub e: f32,
    /// Vertical translation
    pub f: f32,
}

impl Matrix {
    /// Create an identity matrix.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_idmark::content::Matrix;
    ///
    /// let m = Matrix::identity();
    /// assert_eq!(m.a, 1.0);
    /// assert_eq!(m.d, 1.0);
    /// assert_eq!(m.e, 0.0);
    /// ```
    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }

    /// Create a matrix from its six components.
    pub fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// Create a translation matrix.
    pub fn translation(tx: f32, ty: f32) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// Multiply this matrix with another matrix.
    ///
    /// The result represents first applying `self`, then applying `other`,
    /// so `text_matrix.multiply(&ctm)` maps text space to user space.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_idmark::content::Matrix;
    ///
    /// let scale = Matrix::new(2.0, 0.0, 0.0, 2.0, 0.0, 0.0);
    /// let shift = Matrix::translation(10.0, 0.0);
    /// let p = scale.multiply(&shift).transform_point(1.0, 1.0);
    /// assert_eq!((p.x, p.y), (12.0, 2.0));
    /// ```
    pub fn multiply(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    /// Transform a point using this matrix.
    pub fn transform_point(&self, x: f32, y: f32) -> Point {
        Point::new(self.a * x + self.c * y + self.e, self.b * x + self.d * y + self.f)
    }

    /// Bounding box of a rectangle after transformation.
    ///
    /// All four corners are mapped, so rotated text still yields an
    /// axis-aligned box that covers every glyph.
    pub fn transform_rect(&self, rect: &Rect) -> Rect {
        let corners = [
            self.transform_point(rect.x0, rect.y0),
            self.transform_point(rect.x1, rect.y0),
            self.transform_point(rect.x0, rect.y1),
            self.transform_point(rect.x1, rect.y1),
        ];
        let (mut x0, mut y0) = (f32::INFINITY, f32::INFINITY);
        let (mut x1, mut y1) = (f32::NEG_INFINITY, f32::NEG_INFINITY);
        for p in corners {
            x0 = x0.min(p.x);
            y0 = y0.min(p.y);
            x1 = x1.max(p.x);
            y1 = y1.max(p.y);
        }
        Rect { x0, y0, x1, y1 }
    }

    /// Length of the unit vertical vector after transformation.
    pub fn vertical_scale(&self) -> f32 {
        (self.c * self.c + self.d * self.d).sqrt()
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::identity()
    }
}

/// Parameters that position glyphs.
#[derive(Debug, Clone)]
pub struct GraphicsState {
    /// Current transformation matrix (maps user space to page space)
    pub ctm: Matrix,
    /// Text matrix (maps text space to user space)
    pub text_matrix: Matrix,
    /// Text line matrix (start of the current line)
    pub text_line_matrix: Matrix,
    /// Character spacing (Tc)
    pub char_space: f32,
    /// Word spacing (Tw)
    pub word_space: f32,
    /// Horizontal scaling percentage (Tz)
    pub horizontal_scaling: f32,
    /// Text leading (TL)
    pub leading: f32,
    /// Current font resource name
    pub font_name: Option<Vec<u8>>,
    /// Current font size (Tf)
    pub font_size: f32,
    /// Text rise (Ts)
    pub text_rise: f32,
}

impl GraphicsState {
    /// Create a new graphics state with PDF default values.
    pub fn new() -> Self {
        Self {
            ctm: Matrix::identity(),
            text_matrix: Matrix::identity(),
            text_line_matrix: Matrix::identity(),
            char_space: 0.0,
            word_space: 0.0,
            horizontal_scaling: 100.0,
            leading: 0.0,
            font_name: None,
            font_size: 12.0,
            text_rise: 0.0,
        }
    }

    /// Move to the start of the next line offset by `(tx, ty)` (Td).
    pub fn move_text_position(&mut self, tx: f32, ty: f32) {
        self.text_line_matrix = Matrix::translation(tx, ty).multiply(&self.text_line_matrix);
        self.text_matrix = self.text_line_matrix;
    }

    /// Set both text matrices (Tm).
    pub fn set_text_matrix(&mut self, m: Matrix) {
        self.text_matrix = m;
        self.text_line_matrix = m;
    }

    /// Move to the next line using the current leading (T*).
    pub fn next_line(&mut self) {
        let leading = self.leading;
        self.move_text_position(0.0, -leading);
    }

    /// Advance the text matrix horizontally by `tx` text-space units.
    pub fn advance(&mut self, tx: f32) {
        self.text_matrix = Matrix::translation(tx, 0.0).multiply(&self.text_matrix);
    }

    /// Matrix mapping unscaled glyph space (1 unit = 1 em) to page space.
    pub fn glyph_matrix(&self) -> Matrix {
        let size = Matrix::new(
            self.font_size * self.horizontal_scaling / 100.0,
            0.0,
            0.0,
            self.font_size,
            0.0,
            self.text_rise,
        );
        size.multiply(&self.text_matrix).multiply(&self.ctm)
    }
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self::new()
    }
}

/// Stack of graphics states for save/restore operations.
///
/// `q` pushes a copy of the current state and `Q` pops it. An unbalanced `Q`
/// leaves the base state in place.
#[derive(Debug, Clone)]
pub struct GraphicsStateStack {
    stack: Vec<GraphicsState>,
}

impl GraphicsStateStack {
    /// Create a stack holding a single default state.
    pub fn new() -> Self {
        Self::with_ctm(Matrix::identity())
    }

    /// Create a stack whose base state starts from `ctm`.
    pub fn with_ctm(ctm: Matrix) -> Self {
        let mut base = GraphicsState::new();
        base.ctm = ctm;
        Self { stack: vec![base] }
    }

    /// Current state.
    pub fn current(&self) -> &GraphicsState {
        // The stack is never empty: restore() keeps the base state.
        &self.stack[self.stack.len() - 1]
    }

    /// Current state, mutable.
    pub fn current_mut(&mut self) -> &mut GraphicsState {
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    /// Push a copy of the current state (q).
    pub fn save(&mut self) {
        let copy = self.current().clone();
        self.stack.push(copy);
    }

    /// Pop the current state (Q).
    pub fn restore(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
        } else {
            log::debug!("Unbalanced Q operator ignored");
        }
    }

    /// Nesting depth (1 for the base state).
    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

impl Default for GraphicsStateStack {
    fn default() -> Self {
        Self::new()
    }
}
