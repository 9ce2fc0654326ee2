//! Cached mirror of one GL context's state machine.
//!
//! The mirror is written optimistically: a call's new values are stored
//! before the record is forwarded, on the assumption that the driver will
//! accept them. Calls whose success cannot be judged locally flip
//! `needs_driver_query` so the next error query goes to the real driver
//! instead of the sticky slot.

use crate::attrib::{AttribTable, ATTRIB_LIMIT};
use bitflags::bitflags;
use glink_protocol::{glenum, Command};

bitflags! {
    /// Capability switches toggled by `Enable`/`Disable`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CapFlags: u16 {
        const BLEND = 1 << 0;
        const CULL_FACE = 1 << 1;
        const DEPTH_TEST = 1 << 2;
        const DITHER = 1 << 3;
        const POLYGON_OFFSET_FILL = 1 << 4;
        const SAMPLE_ALPHA_TO_COVERAGE = 1 << 5;
        const SAMPLE_COVERAGE = 1 << 6;
        const SCISSOR_TEST = 1 << 7;
        const STENCIL_TEST = 1 << 8;
    }
}

fn cap_flag(cap: u32) -> Option<CapFlags> {
    Some(match cap {
        glenum::BLEND => CapFlags::BLEND,
        glenum::CULL_FACE => CapFlags::CULL_FACE,
        glenum::DEPTH_TEST => CapFlags::DEPTH_TEST,
        glenum::DITHER => CapFlags::DITHER,
        glenum::POLYGON_OFFSET_FILL => CapFlags::POLYGON_OFFSET_FILL,
        glenum::SAMPLE_ALPHA_TO_COVERAGE => CapFlags::SAMPLE_ALPHA_TO_COVERAGE,
        glenum::SAMPLE_COVERAGE => CapFlags::SAMPLE_COVERAGE,
        glenum::SCISSOR_TEST => CapFlags::SCISSOR_TEST,
        glenum::STENCIL_TEST => CapFlags::STENCIL_TEST,
        _ => return None,
    })
}

fn is_blend_factor(v: u32) -> bool {
    matches!(
        v,
        glenum::ZERO
            | glenum::ONE
            | glenum::SRC_COLOR
            | glenum::ONE_MINUS_SRC_COLOR
            | glenum::SRC_ALPHA
            | glenum::ONE_MINUS_SRC_ALPHA
            | glenum::DST_ALPHA
            | glenum::ONE_MINUS_DST_ALPHA
            | glenum::DST_COLOR
            | glenum::ONE_MINUS_DST_COLOR
            | glenum::SRC_ALPHA_SATURATE
            | glenum::CONSTANT_COLOR
            | glenum::ONE_MINUS_CONSTANT_COLOR
            | glenum::CONSTANT_ALPHA
            | glenum::ONE_MINUS_CONSTANT_ALPHA
    )
}

fn is_compare_func(v: u32) -> bool {
    (glenum::NEVER..=glenum::ALWAYS).contains(&v)
}

fn is_draw_mode(v: u32) -> bool {
    v <= glenum::TRIANGLE_FAN
}

fn is_attrib_type(v: u32) -> bool {
    matches!(
        v,
        glenum::BYTE
            | glenum::UNSIGNED_BYTE
            | glenum::SHORT
            | glenum::UNSIGNED_SHORT
            | glenum::FLOAT
            | glenum::FIXED
    )
}

const CLEAR_MASK_ALL: u32 =
    glenum::COLOR_BUFFER_BIT | glenum::DEPTH_BUFFER_BIT | glenum::STENCIL_BUFFER_BIT;

/// Cached GL state for one context. Initial values follow the GL ES 2.0
/// defaults.
#[derive(Debug, Clone)]
pub struct GlMirror {
    /// Sticky error slot: first error wins until queried.
    pub error: u32,
    /// The sticky slot cannot answer the next error query; ask the driver.
    pub needs_driver_query: bool,

    pub caps: CapFlags,

    pub active_texture: u32,
    pub texture_binding_2d: u32,
    pub texture_binding_cube: u32,
    pub array_buffer_binding: u32,
    pub element_array_buffer_binding: u32,
    pub framebuffer_binding: u32,
    pub renderbuffer_binding: u32,
    pub current_program: u32,

    pub blend_color: [f32; 4],
    pub blend_src: u32,
    pub blend_dst: u32,
    pub blend_equation: u32,

    pub clear_color: [f32; 4],
    pub clear_depth: f32,
    pub clear_stencil: i32,

    pub color_mask: [bool; 4],
    pub depth_mask: bool,

    pub cull_face_mode: u32,
    pub front_face: u32,
    pub depth_func: u32,
    pub depth_range: [f32; 2],

    pub line_width: f32,
    pub polygon_offset_factor: f32,
    pub polygon_offset_units: f32,

    pub pack_alignment: i32,
    pub unpack_alignment: i32,

    pub scissor_box: [i32; 4],
    pub viewport: [i32; 4],

    pub stencil_func: u32,
    pub stencil_ref: i32,
    pub stencil_value_mask: u32,
    pub stencil_writemask: u32,

    pub attribs: AttribTable,

    /// Implementation limits, cached after the first driver round-trip.
    pub max_texture_size: Option<i32>,
    pub max_vertex_attribs: Option<i32>,
}

impl Default for GlMirror {
    fn default() -> Self {
        Self {
            error: glenum::NO_ERROR,
            needs_driver_query: false,
            caps: CapFlags::DITHER,
            active_texture: glenum::TEXTURE0,
            texture_binding_2d: 0,
            texture_binding_cube: 0,
            array_buffer_binding: 0,
            element_array_buffer_binding: 0,
            framebuffer_binding: 0,
            renderbuffer_binding: 0,
            current_program: 0,
            blend_color: [0.0; 4],
            blend_src: glenum::ONE,
            blend_dst: glenum::ZERO,
            blend_equation: glenum::FUNC_ADD,
            clear_color: [0.0; 4],
            clear_depth: 1.0,
            clear_stencil: 0,
            color_mask: [true; 4],
            depth_mask: true,
            cull_face_mode: glenum::BACK,
            front_face: glenum::CCW,
            depth_func: glenum::LESS,
            depth_range: [0.0, 1.0],
            line_width: 1.0,
            polygon_offset_factor: 0.0,
            polygon_offset_units: 0.0,
            pack_alignment: 4,
            unpack_alignment: 4,
            scissor_box: [0; 4],
            viewport: [0; 4],
            stencil_func: glenum::ALWAYS,
            stencil_ref: 0,
            stencil_value_mask: u32::MAX,
            stencil_writemask: u32::MAX,
            attribs: AttribTable::new(),
            max_texture_size: None,
            max_vertex_attribs: None,
        }
    }
}

impl GlMirror {
    /// Record a locally detected error. First error wins until queried.
    pub fn record_error(&mut self, error: u32) {
        if self.error == glenum::NO_ERROR {
            self.error = error;
        }
    }

    /// Take and clear the sticky error.
    pub fn take_error(&mut self) -> u32 {
        core::mem::replace(&mut self.error, glenum::NO_ERROR)
    }

    /// Check a command's parameters against the per-call allow-lists.
    /// Returns the GL error to record on violation.
    pub fn validate(&self, cmd: &Command) -> Result<(), u32> {
        match cmd {
            Command::ActiveTexture { unit } => {
                if !(glenum::TEXTURE0..=glenum::TEXTURE31).contains(unit) {
                    return Err(glenum::INVALID_ENUM);
                }
            }
            Command::BindBuffer { target, .. }
            | Command::BufferData { target, .. }
            | Command::BufferSubData { target, .. } => {
                if !matches!(
                    *target,
                    glenum::ARRAY_BUFFER | glenum::ELEMENT_ARRAY_BUFFER
                ) {
                    return Err(glenum::INVALID_ENUM);
                }
                if let Command::BufferData { usage, .. } = cmd {
                    if !matches!(
                        *usage,
                        glenum::STREAM_DRAW | glenum::STATIC_DRAW | glenum::DYNAMIC_DRAW
                    ) {
                        return Err(glenum::INVALID_ENUM);
                    }
                }
            }
            Command::BindTexture { target, .. } => {
                if !matches!(*target, glenum::TEXTURE_2D | glenum::TEXTURE_CUBE_MAP) {
                    return Err(glenum::INVALID_ENUM);
                }
            }
            Command::BindFramebuffer { target, .. } => {
                if *target != glenum::FRAMEBUFFER {
                    return Err(glenum::INVALID_ENUM);
                }
            }
            Command::BindRenderbuffer { target, .. } => {
                if *target != glenum::RENDERBUFFER {
                    return Err(glenum::INVALID_ENUM);
                }
            }
            Command::BlendEquation { mode } => {
                if !matches!(
                    *mode,
                    glenum::FUNC_ADD | glenum::FUNC_SUBTRACT | glenum::FUNC_REVERSE_SUBTRACT
                ) {
                    return Err(glenum::INVALID_ENUM);
                }
            }
            Command::BlendFunc { src, dst } => {
                if !is_blend_factor(*src) || !is_blend_factor(*dst) {
                    return Err(glenum::INVALID_ENUM);
                }
            }
            Command::CullFace { mode } => {
                if !matches!(
                    *mode,
                    glenum::FRONT | glenum::BACK | glenum::FRONT_AND_BACK
                ) {
                    return Err(glenum::INVALID_ENUM);
                }
            }
            Command::DepthFunc { func } => {
                if !is_compare_func(*func) {
                    return Err(glenum::INVALID_ENUM);
                }
            }
            Command::Enable { cap } | Command::Disable { cap } => {
                if cap_flag(*cap).is_none() {
                    return Err(glenum::INVALID_ENUM);
                }
            }
            Command::FrontFace { mode } => {
                if !matches!(*mode, glenum::CW | glenum::CCW) {
                    return Err(glenum::INVALID_ENUM);
                }
            }
            Command::LineWidth { width } => {
                if *width <= 0.0 {
                    return Err(glenum::INVALID_VALUE);
                }
            }
            Command::PixelStore { pname, param } => {
                if !matches!(*pname, glenum::PACK_ALIGNMENT | glenum::UNPACK_ALIGNMENT) {
                    return Err(glenum::INVALID_ENUM);
                }
                if !matches!(*param, 1 | 2 | 4 | 8) {
                    return Err(glenum::INVALID_VALUE);
                }
            }
            Command::Scissor { width, height, .. } | Command::Viewport { width, height, .. } => {
                if *width < 0 || *height < 0 {
                    return Err(glenum::INVALID_VALUE);
                }
            }
            Command::StencilFunc { func, .. } => {
                if !is_compare_func(*func) {
                    return Err(glenum::INVALID_ENUM);
                }
            }
            Command::VertexAttribPointer {
                index,
                size,
                ty,
                stride,
                ..
            } => {
                if *index >= ATTRIB_LIMIT {
                    return Err(glenum::INVALID_VALUE);
                }
                if !(1..=4).contains(size) || *stride < 0 {
                    return Err(glenum::INVALID_VALUE);
                }
                if !is_attrib_type(*ty) {
                    return Err(glenum::INVALID_ENUM);
                }
            }
            Command::EnableVertexAttribArray { index }
            | Command::DisableVertexAttribArray { index } => {
                if *index >= ATTRIB_LIMIT {
                    return Err(glenum::INVALID_VALUE);
                }
            }
            Command::CreateShader { kind } => {
                if !matches!(*kind, glenum::VERTEX_SHADER | glenum::FRAGMENT_SHADER) {
                    return Err(glenum::INVALID_ENUM);
                }
            }
            Command::TexImage2d {
                target,
                level,
                width,
                height,
                border,
                ..
            } => {
                if *target != glenum::TEXTURE_2D {
                    return Err(glenum::INVALID_ENUM);
                }
                if *level < 0 || *width < 0 || *height < 0 || *border != 0 {
                    return Err(glenum::INVALID_VALUE);
                }
            }
            Command::TexSubImage2d {
                target,
                level,
                xoffset,
                yoffset,
                width,
                height,
                ..
            } => {
                if *target != glenum::TEXTURE_2D {
                    return Err(glenum::INVALID_ENUM);
                }
                if *level < 0 || *xoffset < 0 || *yoffset < 0 || *width < 0 || *height < 0 {
                    return Err(glenum::INVALID_VALUE);
                }
            }
            Command::Clear { mask } => {
                if *mask & !CLEAR_MASK_ALL != 0 {
                    return Err(glenum::INVALID_VALUE);
                }
            }
            Command::DrawArrays { mode, first, count } => {
                if !is_draw_mode(*mode) {
                    return Err(glenum::INVALID_ENUM);
                }
                if *first < 0 || *count < 0 {
                    return Err(glenum::INVALID_VALUE);
                }
            }
            Command::DrawElements {
                mode, count, ty, ..
            } => {
                if !is_draw_mode(*mode) {
                    return Err(glenum::INVALID_ENUM);
                }
                if !matches!(
                    *ty,
                    glenum::UNSIGNED_BYTE | glenum::UNSIGNED_SHORT | glenum::UNSIGNED_INT
                ) {
                    return Err(glenum::INVALID_ENUM);
                }
                if *count < 0 {
                    return Err(glenum::INVALID_VALUE);
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Whether forwarding `cmd` would be a no-op against the cached state.
    pub fn is_redundant(&self, cmd: &Command) -> bool {
        match cmd {
            Command::ActiveTexture { unit } => *unit == self.active_texture,
            Command::BindBuffer { target, buffer } => match *target {
                glenum::ARRAY_BUFFER => *buffer == self.array_buffer_binding,
                glenum::ELEMENT_ARRAY_BUFFER => *buffer == self.element_array_buffer_binding,
                _ => false,
            },
            Command::BindTexture { target, texture } => match *target {
                glenum::TEXTURE_2D => *texture == self.texture_binding_2d,
                glenum::TEXTURE_CUBE_MAP => *texture == self.texture_binding_cube,
                _ => false,
            },
            Command::BindFramebuffer { framebuffer, .. } => {
                *framebuffer == self.framebuffer_binding
            }
            Command::BindRenderbuffer { renderbuffer, .. } => {
                *renderbuffer == self.renderbuffer_binding
            }
            Command::BlendColor { color } => *color == self.blend_color,
            Command::BlendEquation { mode } => *mode == self.blend_equation,
            Command::BlendFunc { src, dst } => {
                *src == self.blend_src && *dst == self.blend_dst
            }
            Command::ClearColor { color } => *color == self.clear_color,
            Command::ClearDepth { depth } => *depth == self.clear_depth,
            Command::ClearStencil { stencil } => *stencil == self.clear_stencil,
            Command::ColorMask { mask } => *mask == self.color_mask,
            Command::CullFace { mode } => *mode == self.cull_face_mode,
            Command::DepthFunc { func } => *func == self.depth_func,
            Command::DepthMask { flag } => *flag == self.depth_mask,
            Command::DepthRange { near, far } => {
                [*near, *far] == self.depth_range
            }
            Command::Enable { cap } => {
                cap_flag(*cap).is_some_and(|flag| self.caps.contains(flag))
            }
            Command::Disable { cap } => {
                cap_flag(*cap).is_some_and(|flag| !self.caps.contains(flag))
            }
            Command::FrontFace { mode } => *mode == self.front_face,
            Command::LineWidth { width } => *width == self.line_width,
            Command::PixelStore { pname, param } => match *pname {
                glenum::PACK_ALIGNMENT => *param == self.pack_alignment,
                glenum::UNPACK_ALIGNMENT => *param == self.unpack_alignment,
                _ => false,
            },
            Command::PolygonOffset { factor, units } => {
                *factor == self.polygon_offset_factor && *units == self.polygon_offset_units
            }
            Command::Scissor {
                x,
                y,
                width,
                height,
            } => [*x, *y, *width, *height] == self.scissor_box,
            Command::StencilFunc {
                func,
                reference,
                mask,
            } => {
                *func == self.stencil_func
                    && *reference == self.stencil_ref
                    && *mask == self.stencil_value_mask
            }
            Command::StencilMask { mask } => *mask == self.stencil_writemask,
            Command::UseProgram { program } => *program == self.current_program,
            Command::Viewport {
                x,
                y,
                width,
                height,
            } => [*x, *y, *width, *height] == self.viewport,
            Command::EnableVertexAttribArray { index } => {
                self.attribs.get(*index).is_some_and(|a| a.enabled)
            }
            Command::DisableVertexAttribArray { index } => {
                // Untouched attributes start disabled.
                self.attribs.get(*index).map_or(true, |a| !a.enabled)
            }
            _ => false,
        }
    }

    /// Fold `cmd`'s new values into the cache. Called before forwarding.
    pub fn apply(&mut self, cmd: &Command) {
        match cmd {
            Command::ActiveTexture { unit } => self.active_texture = *unit,
            Command::BindBuffer { target, buffer } => match *target {
                glenum::ARRAY_BUFFER => self.array_buffer_binding = *buffer,
                glenum::ELEMENT_ARRAY_BUFFER => self.element_array_buffer_binding = *buffer,
                _ => {}
            },
            Command::BindTexture { target, texture } => match *target {
                glenum::TEXTURE_2D => self.texture_binding_2d = *texture,
                glenum::TEXTURE_CUBE_MAP => self.texture_binding_cube = *texture,
                _ => {}
            },
            Command::BindFramebuffer { framebuffer, .. } => {
                self.framebuffer_binding = *framebuffer
            }
            Command::BindRenderbuffer { renderbuffer, .. } => {
                self.renderbuffer_binding = *renderbuffer
            }
            Command::BlendColor { color } => self.blend_color = *color,
            Command::BlendEquation { mode } => self.blend_equation = *mode,
            Command::BlendFunc { src, dst } => {
                self.blend_src = *src;
                self.blend_dst = *dst;
            }
            Command::ClearColor { color } => self.clear_color = *color,
            Command::ClearDepth { depth } => self.clear_depth = *depth,
            Command::ClearStencil { stencil } => self.clear_stencil = *stencil,
            Command::ColorMask { mask } => self.color_mask = *mask,
            Command::CullFace { mode } => self.cull_face_mode = *mode,
            Command::DepthFunc { func } => self.depth_func = *func,
            Command::DepthMask { flag } => self.depth_mask = *flag,
            Command::DepthRange { near, far } => self.depth_range = [*near, *far],
            Command::Enable { cap } => {
                if let Some(flag) = cap_flag(*cap) {
                    self.caps.insert(flag);
                }
            }
            Command::Disable { cap } => {
                if let Some(flag) = cap_flag(*cap) {
                    self.caps.remove(flag);
                }
            }
            Command::FrontFace { mode } => self.front_face = *mode,
            Command::LineWidth { width } => self.line_width = *width,
            Command::PixelStore { pname, param } => match *pname {
                glenum::PACK_ALIGNMENT => self.pack_alignment = *param,
                glenum::UNPACK_ALIGNMENT => self.unpack_alignment = *param,
                _ => {}
            },
            Command::PolygonOffset { factor, units } => {
                self.polygon_offset_factor = *factor;
                self.polygon_offset_units = *units;
            }
            Command::Scissor {
                x,
                y,
                width,
                height,
            } => self.scissor_box = [*x, *y, *width, *height],
            Command::StencilFunc {
                func,
                reference,
                mask,
            } => {
                self.stencil_func = *func;
                self.stencil_ref = *reference;
                self.stencil_value_mask = *mask;
            }
            Command::StencilMask { mask } => self.stencil_writemask = *mask,
            Command::UseProgram { program } => self.current_program = *program,
            Command::Viewport {
                x,
                y,
                width,
                height,
            } => self.viewport = [*x, *y, *width, *height],
            Command::VertexAttribPointer {
                index,
                size,
                ty,
                normalized,
                stride,
                offset,
            } => {
                let buffer_binding = self.array_buffer_binding;
                let attrib = self.attribs.entry(*index);
                attrib.buffer_binding = buffer_binding;
                attrib.size = *size;
                attrib.ty = *ty;
                attrib.normalized = *normalized;
                attrib.stride = *stride;
                attrib.offset = *offset;
            }
            Command::EnableVertexAttribArray { index } => {
                self.attribs.entry(*index).enabled = true;
            }
            Command::DisableVertexAttribArray { index } => {
                self.attribs.entry(*index).enabled = false;
            }
            Command::DeleteObjects { namespace, names } => {
                self.unbind_deleted(*namespace, names)
            }
            _ => {}
        }
    }

    /// Answer an integer query from the cache, if the value is mirrored.
    pub fn local_integer(&self, pname: u32) -> Option<Vec<i32>> {
        Some(match pname {
            glenum::VIEWPORT => self.viewport.to_vec(),
            glenum::SCISSOR_BOX => self.scissor_box.to_vec(),
            glenum::ARRAY_BUFFER_BINDING => vec![self.array_buffer_binding as i32],
            glenum::ELEMENT_ARRAY_BUFFER_BINDING => {
                vec![self.element_array_buffer_binding as i32]
            }
            glenum::TEXTURE_BINDING_2D => vec![self.texture_binding_2d as i32],
            glenum::TEXTURE_BINDING_CUBE_MAP => vec![self.texture_binding_cube as i32],
            glenum::FRAMEBUFFER_BINDING => vec![self.framebuffer_binding as i32],
            glenum::RENDERBUFFER_BINDING => vec![self.renderbuffer_binding as i32],
            glenum::CURRENT_PROGRAM => vec![self.current_program as i32],
            glenum::ACTIVE_TEXTURE => vec![self.active_texture as i32],
            glenum::PACK_ALIGNMENT => vec![self.pack_alignment],
            glenum::UNPACK_ALIGNMENT => vec![self.unpack_alignment],
            glenum::MAX_TEXTURE_SIZE => vec![self.max_texture_size?],
            glenum::MAX_VERTEX_ATTRIBS => vec![self.max_vertex_attribs?],
            _ => return None,
        })
    }

    /// Store a driver-reported implementation limit for later local answers.
    pub fn cache_limit(&mut self, pname: u32, value: i32) {
        match pname {
            glenum::MAX_TEXTURE_SIZE => self.max_texture_size = Some(value),
            glenum::MAX_VERTEX_ATTRIBS => self.max_vertex_attribs = Some(value),
            _ => {}
        }
    }

    /// GL unbinds deleted objects that are currently bound.
    fn unbind_deleted(&mut self, namespace: glink_protocol::Namespace, names: &[u32]) {
        use glink_protocol::Namespace;
        for &name in names {
            if name == 0 {
                continue;
            }
            match namespace {
                Namespace::Buffer => {
                    if self.array_buffer_binding == name {
                        self.array_buffer_binding = 0;
                    }
                    if self.element_array_buffer_binding == name {
                        self.element_array_buffer_binding = 0;
                    }
                }
                Namespace::Texture => {
                    if self.texture_binding_2d == name {
                        self.texture_binding_2d = 0;
                    }
                    if self.texture_binding_cube == name {
                        self.texture_binding_cube = 0;
                    }
                }
                Namespace::Framebuffer => {
                    if self.framebuffer_binding == name {
                        self.framebuffer_binding = 0;
                    }
                }
                Namespace::Renderbuffer => {
                    if self.renderbuffer_binding == name {
                        self.renderbuffer_binding = 0;
                    }
                }
            }
        }
    }
}
