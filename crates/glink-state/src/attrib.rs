//! Client-side vertex attribute table.
//!
//! The first few attributes a context touches are stored inline; anything
//! beyond spills to the heap. The spill storage is freed together with the
//! context record when the registry sweeps it.

/// Attribute entries stored without heap allocation.
pub const INLINE_ATTRIBS: usize = 8;

/// Hard cap on attribute indices the mirror tracks. Indices at or above this
/// fail validation before a record is produced.
pub const ATTRIB_LIMIT: u32 = 32;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexAttrib {
    pub index: u32,
    /// `ARRAY_BUFFER` binding captured at pointer-set time.
    pub buffer_binding: u32,
    pub enabled: bool,
    pub size: i32,
    pub stride: i32,
    pub ty: u32,
    pub normalized: bool,
    pub offset: u64,
    pub current: [f32; 4],
}

impl VertexAttrib {
    fn new(index: u32) -> Self {
        Self {
            index,
            buffer_binding: 0,
            enabled: false,
            size: 4,
            stride: 0,
            ty: glink_protocol::glenum::FLOAT,
            normalized: false,
            offset: 0,
            current: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

#[derive(Debug, Clone)]
pub struct AttribTable {
    inline: [VertexAttrib; INLINE_ATTRIBS],
    inline_len: usize,
    spill: Vec<VertexAttrib>,
}

impl AttribTable {
    pub fn new() -> Self {
        Self {
            inline: [VertexAttrib::new(0); INLINE_ATTRIBS],
            inline_len: 0,
            spill: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.inline_len + self.spill.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether any entries have spilled past the inline storage.
    pub fn spilled(&self) -> bool {
        !self.spill.is_empty()
    }

    pub fn get(&self, index: u32) -> Option<&VertexAttrib> {
        self.inline[..self.inline_len]
            .iter()
            .chain(self.spill.iter())
            .find(|a| a.index == index)
    }

    /// Entry for `index`, created with GL defaults on first touch.
    pub fn entry(&mut self, index: u32) -> &mut VertexAttrib {
        debug_assert!(index < ATTRIB_LIMIT);
        if let Some(i) = self.inline[..self.inline_len]
            .iter()
            .position(|a| a.index == index)
        {
            return &mut self.inline[i];
        }
        if let Some(i) = self.spill.iter().position(|a| a.index == index) {
            return &mut self.spill[i];
        }
        if self.inline_len < INLINE_ATTRIBS {
            self.inline[self.inline_len] = VertexAttrib::new(index);
            self.inline_len += 1;
            &mut self.inline[self.inline_len - 1]
        } else {
            self.spill.push(VertexAttrib::new(index));
            let last = self.spill.len() - 1;
            &mut self.spill[last]
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &VertexAttrib> {
        self.inline[..self.inline_len].iter().chain(self.spill.iter())
    }
}

impl Default for AttribTable {
    fn default() -> Self {
        Self::new()
    }
}
