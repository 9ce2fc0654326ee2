//! Decoded command records and their payload codec.

use crate::wire::{
    push_bool, push_bytes, push_f32, push_i32, push_u32, push_u64, DecodeError, Reader,
};

/// Opaque EGL display handle as seen by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DisplayId(pub u64);

/// Opaque EGL surface handle as seen by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u64);

/// Opaque EGL context handle as seen by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ContextId(pub u64);

impl DisplayId {
    pub const NONE: Self = Self(0);
}

impl SurfaceId {
    pub const NONE: Self = Self(0);
}

impl ContextId {
    pub const NONE: Self = Self(0);
}

/// Object namespace for virtualized driver names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Namespace {
    Buffer = 0,
    Texture = 1,
    Framebuffer = 2,
    Renderbuffer = 3,
}

impl Namespace {
    pub const ALL: [Namespace; 4] = [
        Namespace::Buffer,
        Namespace::Texture,
        Namespace::Framebuffer,
        Namespace::Renderbuffer,
    ];

    pub fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            0 => Self::Buffer,
            1 => Self::Texture,
            2 => Self::Framebuffer,
            3 => Self::Renderbuffer,
            _ => return None,
        })
    }
}

/// Record opcodes. Grouped by concern; values are part of the wire contract.
pub mod opcode {
    // Context / surface lifecycle.
    pub const MAKE_CURRENT: u32 = 0x0001;
    pub const DESTROY_CONTEXT: u32 = 0x0002;
    pub const DESTROY_SURFACE: u32 = 0x0003;
    pub const TERMINATE: u32 = 0x0004;
    pub const RELEASE_THREAD: u32 = 0x0005;
    pub const DISCONNECT: u32 = 0x000F;

    // Cached state setters.
    pub const ACTIVE_TEXTURE: u32 = 0x0100;
    pub const BIND_BUFFER: u32 = 0x0101;
    pub const BIND_TEXTURE: u32 = 0x0102;
    pub const BIND_FRAMEBUFFER: u32 = 0x0103;
    pub const BIND_RENDERBUFFER: u32 = 0x0104;
    pub const BLEND_COLOR: u32 = 0x0105;
    pub const BLEND_EQUATION: u32 = 0x0106;
    pub const BLEND_FUNC: u32 = 0x0107;
    pub const CLEAR_COLOR: u32 = 0x0108;
    pub const CLEAR_DEPTH: u32 = 0x0109;
    pub const CLEAR_STENCIL: u32 = 0x010A;
    pub const COLOR_MASK: u32 = 0x010B;
    pub const CULL_FACE: u32 = 0x010C;
    pub const DEPTH_FUNC: u32 = 0x010D;
    pub const DEPTH_MASK: u32 = 0x010E;
    pub const DEPTH_RANGE: u32 = 0x010F;
    pub const DISABLE: u32 = 0x0110;
    pub const ENABLE: u32 = 0x0111;
    pub const FRONT_FACE: u32 = 0x0112;
    pub const LINE_WIDTH: u32 = 0x0113;
    pub const PIXEL_STORE: u32 = 0x0114;
    pub const POLYGON_OFFSET: u32 = 0x0115;
    pub const SCISSOR: u32 = 0x0116;
    pub const STENCIL_FUNC: u32 = 0x0117;
    pub const STENCIL_MASK: u32 = 0x0118;
    pub const USE_PROGRAM: u32 = 0x0119;
    pub const VIEWPORT: u32 = 0x011A;
    pub const VERTEX_ATTRIB_POINTER: u32 = 0x011B;
    pub const ENABLE_VERTEX_ATTRIB_ARRAY: u32 = 0x011C;
    pub const DISABLE_VERTEX_ATTRIB_ARRAY: u32 = 0x011D;

    // Object management.
    pub const GEN_OBJECTS: u32 = 0x0200;
    pub const DELETE_OBJECTS: u32 = 0x0201;
    pub const CREATE_SHADER: u32 = 0x0202;
    pub const CREATE_PROGRAM: u32 = 0x0203;
    pub const DELETE_SHADER: u32 = 0x0204;
    pub const DELETE_PROGRAM: u32 = 0x0205;
    pub const SHADER_SOURCE: u32 = 0x0206;
    pub const COMPILE_SHADER: u32 = 0x0207;
    pub const ATTACH_SHADER: u32 = 0x0208;
    pub const LINK_PROGRAM: u32 = 0x0209;

    // Data uploads.
    pub const BUFFER_DATA: u32 = 0x0300;
    pub const BUFFER_SUB_DATA: u32 = 0x0301;
    pub const TEX_IMAGE_2D: u32 = 0x0302;
    pub const TEX_SUB_IMAGE_2D: u32 = 0x0303;

    // Drawing and ordering.
    pub const CLEAR: u32 = 0x0400;
    pub const DRAW_ARRAYS: u32 = 0x0401;
    pub const DRAW_ELEMENTS: u32 = 0x0402;
    pub const FLUSH: u32 = 0x0403;
    pub const FINISH: u32 = 0x0404;

    // Queries.
    pub const GET_ERROR: u32 = 0x0500;
    pub const GET_INTEGER: u32 = 0x0501;
}

/// One decoded command record.
///
/// Enum values in `u32` fields carry raw GL constants; validation against the
/// per-call allow-lists happens on the issuing side before a record is ever
/// produced, so the executing side treats them as opaque.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    MakeCurrent {
        display: DisplayId,
        draw: SurfaceId,
        read: SurfaceId,
        context: ContextId,
    },
    DestroyContext {
        display: DisplayId,
        context: ContextId,
    },
    DestroySurface {
        display: DisplayId,
        surface: SurfaceId,
    },
    Terminate {
        display: DisplayId,
    },
    ReleaseThread,
    /// Producer is going away; the consumer loop should exit after this.
    Disconnect,

    ActiveTexture {
        unit: u32,
    },
    BindBuffer {
        target: u32,
        buffer: u32,
    },
    BindTexture {
        target: u32,
        texture: u32,
    },
    BindFramebuffer {
        target: u32,
        framebuffer: u32,
    },
    BindRenderbuffer {
        target: u32,
        renderbuffer: u32,
    },
    BlendColor {
        color: [f32; 4],
    },
    BlendEquation {
        mode: u32,
    },
    BlendFunc {
        src: u32,
        dst: u32,
    },
    ClearColor {
        color: [f32; 4],
    },
    ClearDepth {
        depth: f32,
    },
    ClearStencil {
        stencil: i32,
    },
    ColorMask {
        mask: [bool; 4],
    },
    CullFace {
        mode: u32,
    },
    DepthFunc {
        func: u32,
    },
    DepthMask {
        flag: bool,
    },
    DepthRange {
        near: f32,
        far: f32,
    },
    Disable {
        cap: u32,
    },
    Enable {
        cap: u32,
    },
    FrontFace {
        mode: u32,
    },
    LineWidth {
        width: f32,
    },
    PixelStore {
        pname: u32,
        param: i32,
    },
    PolygonOffset {
        factor: f32,
        units: f32,
    },
    Scissor {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    },
    StencilFunc {
        func: u32,
        reference: i32,
        mask: u32,
    },
    StencilMask {
        mask: u32,
    },
    UseProgram {
        program: u32,
    },
    Viewport {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    },
    VertexAttribPointer {
        index: u32,
        size: i32,
        ty: u32,
        normalized: bool,
        stride: i32,
        offset: u64,
    },
    EnableVertexAttribArray {
        index: u32,
    },
    DisableVertexAttribArray {
        index: u32,
    },

    /// Virtual names minted by the client; the server maps them to real ones.
    GenObjects {
        namespace: Namespace,
        names: Vec<u32>,
    },
    DeleteObjects {
        namespace: Namespace,
        names: Vec<u32>,
    },
    CreateShader {
        kind: u32,
    },
    CreateProgram,
    DeleteShader {
        shader: u32,
    },
    DeleteProgram {
        program: u32,
    },
    ShaderSource {
        shader: u32,
        source: String,
    },
    CompileShader {
        shader: u32,
    },
    AttachShader {
        program: u32,
        shader: u32,
    },
    LinkProgram {
        program: u32,
    },

    BufferData {
        target: u32,
        usage: u32,
        data: Vec<u8>,
    },
    BufferSubData {
        target: u32,
        offset: u64,
        data: Vec<u8>,
    },
    TexImage2d {
        target: u32,
        level: i32,
        internal_format: u32,
        width: i32,
        height: i32,
        border: i32,
        format: u32,
        ty: u32,
        pixels: Option<Vec<u8>>,
    },
    TexSubImage2d {
        target: u32,
        level: i32,
        xoffset: i32,
        yoffset: i32,
        width: i32,
        height: i32,
        format: u32,
        ty: u32,
        pixels: Vec<u8>,
    },

    Clear {
        mask: u32,
    },
    DrawArrays {
        mode: u32,
        first: i32,
        count: i32,
    },
    DrawElements {
        mode: u32,
        count: i32,
        ty: u32,
        offset: u64,
    },
    Flush,
    Finish,

    GetError,
    GetInteger {
        pname: u32,
    },
}

impl Command {
    pub fn opcode(&self) -> u32 {
        use opcode::*;
        match self {
            Command::MakeCurrent { .. } => MAKE_CURRENT,
            Command::DestroyContext { .. } => DESTROY_CONTEXT,
            Command::DestroySurface { .. } => DESTROY_SURFACE,
            Command::Terminate { .. } => TERMINATE,
            Command::ReleaseThread => RELEASE_THREAD,
            Command::Disconnect => DISCONNECT,
            Command::ActiveTexture { .. } => ACTIVE_TEXTURE,
            Command::BindBuffer { .. } => BIND_BUFFER,
            Command::BindTexture { .. } => BIND_TEXTURE,
            Command::BindFramebuffer { .. } => BIND_FRAMEBUFFER,
            Command::BindRenderbuffer { .. } => BIND_RENDERBUFFER,
            Command::BlendColor { .. } => BLEND_COLOR,
            Command::BlendEquation { .. } => BLEND_EQUATION,
            Command::BlendFunc { .. } => BLEND_FUNC,
            Command::ClearColor { .. } => CLEAR_COLOR,
            Command::ClearDepth { .. } => CLEAR_DEPTH,
            Command::ClearStencil { .. } => CLEAR_STENCIL,
            Command::ColorMask { .. } => COLOR_MASK,
            Command::CullFace { .. } => CULL_FACE,
            Command::DepthFunc { .. } => DEPTH_FUNC,
            Command::DepthMask { .. } => DEPTH_MASK,
            Command::DepthRange { .. } => DEPTH_RANGE,
            Command::Disable { .. } => DISABLE,
            Command::Enable { .. } => ENABLE,
            Command::FrontFace { .. } => FRONT_FACE,
            Command::LineWidth { .. } => LINE_WIDTH,
            Command::PixelStore { .. } => PIXEL_STORE,
            Command::PolygonOffset { .. } => POLYGON_OFFSET,
            Command::Scissor { .. } => SCISSOR,
            Command::StencilFunc { .. } => STENCIL_FUNC,
            Command::StencilMask { .. } => STENCIL_MASK,
            Command::UseProgram { .. } => USE_PROGRAM,
            Command::Viewport { .. } => VIEWPORT,
            Command::VertexAttribPointer { .. } => VERTEX_ATTRIB_POINTER,
            Command::EnableVertexAttribArray { .. } => ENABLE_VERTEX_ATTRIB_ARRAY,
            Command::DisableVertexAttribArray { .. } => DISABLE_VERTEX_ATTRIB_ARRAY,
            Command::GenObjects { .. } => GEN_OBJECTS,
            Command::DeleteObjects { .. } => DELETE_OBJECTS,
            Command::CreateShader { .. } => CREATE_SHADER,
            Command::CreateProgram => CREATE_PROGRAM,
            Command::DeleteShader { .. } => DELETE_SHADER,
            Command::DeleteProgram { .. } => DELETE_PROGRAM,
            Command::ShaderSource { .. } => SHADER_SOURCE,
            Command::CompileShader { .. } => COMPILE_SHADER,
            Command::AttachShader { .. } => ATTACH_SHADER,
            Command::LinkProgram { .. } => LINK_PROGRAM,
            Command::BufferData { .. } => BUFFER_DATA,
            Command::BufferSubData { .. } => BUFFER_SUB_DATA,
            Command::TexImage2d { .. } => TEX_IMAGE_2D,
            Command::TexSubImage2d { .. } => TEX_SUB_IMAGE_2D,
            Command::Clear { .. } => CLEAR,
            Command::DrawArrays { .. } => DRAW_ARRAYS,
            Command::DrawElements { .. } => DRAW_ELEMENTS,
            Command::Flush => FLUSH,
            Command::Finish => FINISH,
            Command::GetError => GET_ERROR,
            Command::GetInteger { .. } => GET_INTEGER,
        }
    }

    pub fn encode_payload(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode_payload_into(&mut out);
        out
    }

    pub fn encode_payload_into(&self, out: &mut Vec<u8>) {
        match self {
            Command::MakeCurrent {
                display,
                draw,
                read,
                context,
            } => {
                push_u64(out, display.0);
                push_u64(out, draw.0);
                push_u64(out, read.0);
                push_u64(out, context.0);
            }
            Command::DestroyContext { display, context } => {
                push_u64(out, display.0);
                push_u64(out, context.0);
            }
            Command::DestroySurface { display, surface } => {
                push_u64(out, display.0);
                push_u64(out, surface.0);
            }
            Command::Terminate { display } => push_u64(out, display.0),
            Command::ReleaseThread | Command::Disconnect => {}

            Command::ActiveTexture { unit } => push_u32(out, *unit),
            Command::BindBuffer { target, buffer } => {
                push_u32(out, *target);
                push_u32(out, *buffer);
            }
            Command::BindTexture { target, texture } => {
                push_u32(out, *target);
                push_u32(out, *texture);
            }
            Command::BindFramebuffer {
                target,
                framebuffer,
            } => {
                push_u32(out, *target);
                push_u32(out, *framebuffer);
            }
            Command::BindRenderbuffer {
                target,
                renderbuffer,
            } => {
                push_u32(out, *target);
                push_u32(out, *renderbuffer);
            }
            Command::BlendColor { color } | Command::ClearColor { color } => {
                for c in color {
                    push_f32(out, *c);
                }
            }
            Command::BlendEquation { mode } => push_u32(out, *mode),
            Command::BlendFunc { src, dst } => {
                push_u32(out, *src);
                push_u32(out, *dst);
            }
            Command::ClearDepth { depth } => push_f32(out, *depth),
            Command::ClearStencil { stencil } => push_i32(out, *stencil),
            Command::ColorMask { mask } => {
                for m in mask {
                    push_bool(out, *m);
                }
            }
            Command::CullFace { mode } | Command::FrontFace { mode } => push_u32(out, *mode),
            Command::DepthFunc { func } => push_u32(out, *func),
            Command::DepthMask { flag } => push_bool(out, *flag),
            Command::DepthRange { near, far } => {
                push_f32(out, *near);
                push_f32(out, *far);
            }
            Command::Disable { cap } | Command::Enable { cap } => push_u32(out, *cap),
            Command::LineWidth { width } => push_f32(out, *width),
            Command::PixelStore { pname, param } => {
                push_u32(out, *pname);
                push_i32(out, *param);
            }
            Command::PolygonOffset { factor, units } => {
                push_f32(out, *factor);
                push_f32(out, *units);
            }
            Command::Scissor {
                x,
                y,
                width,
                height,
            }
            | Command::Viewport {
                x,
                y,
                width,
                height,
            } => {
                push_i32(out, *x);
                push_i32(out, *y);
                push_i32(out, *width);
                push_i32(out, *height);
            }
            Command::StencilFunc {
                func,
                reference,
                mask,
            } => {
                push_u32(out, *func);
                push_i32(out, *reference);
                push_u32(out, *mask);
            }
            Command::StencilMask { mask } => push_u32(out, *mask),
            Command::UseProgram { program } => push_u32(out, *program),
            Command::VertexAttribPointer {
                index,
                size,
                ty,
                normalized,
                stride,
                offset,
            } => {
                push_u32(out, *index);
                push_i32(out, *size);
                push_u32(out, *ty);
                push_bool(out, *normalized);
                push_i32(out, *stride);
                push_u64(out, *offset);
            }
            Command::EnableVertexAttribArray { index }
            | Command::DisableVertexAttribArray { index } => push_u32(out, *index),

            Command::GenObjects { namespace, names }
            | Command::DeleteObjects { namespace, names } => {
                out.push(*namespace as u8);
                push_u32(out, names.len() as u32);
                for name in names {
                    push_u32(out, *name);
                }
            }
            Command::CreateShader { kind } => push_u32(out, *kind),
            Command::CreateProgram => {}
            Command::DeleteShader { shader } | Command::CompileShader { shader } => {
                push_u32(out, *shader)
            }
            Command::DeleteProgram { program } | Command::LinkProgram { program } => {
                push_u32(out, *program)
            }
            Command::ShaderSource { shader, source } => {
                push_u32(out, *shader);
                push_bytes(out, source.as_bytes());
            }
            Command::AttachShader { program, shader } => {
                push_u32(out, *program);
                push_u32(out, *shader);
            }

            Command::BufferData {
                target,
                usage,
                data,
            } => {
                push_u32(out, *target);
                push_u32(out, *usage);
                push_bytes(out, data);
            }
            Command::BufferSubData {
                target,
                offset,
                data,
            } => {
                push_u32(out, *target);
                push_u64(out, *offset);
                push_bytes(out, data);
            }
            Command::TexImage2d {
                target,
                level,
                internal_format,
                width,
                height,
                border,
                format,
                ty,
                pixels,
            } => {
                push_u32(out, *target);
                push_i32(out, *level);
                push_u32(out, *internal_format);
                push_i32(out, *width);
                push_i32(out, *height);
                push_i32(out, *border);
                push_u32(out, *format);
                push_u32(out, *ty);
                match pixels {
                    Some(data) => {
                        push_bool(out, true);
                        push_bytes(out, data);
                    }
                    None => push_bool(out, false),
                }
            }
            Command::TexSubImage2d {
                target,
                level,
                xoffset,
                yoffset,
                width,
                height,
                format,
                ty,
                pixels,
            } => {
                push_u32(out, *target);
                push_i32(out, *level);
                push_i32(out, *xoffset);
                push_i32(out, *yoffset);
                push_i32(out, *width);
                push_i32(out, *height);
                push_u32(out, *format);
                push_u32(out, *ty);
                push_bytes(out, pixels);
            }

            Command::Clear { mask } => push_u32(out, *mask),
            Command::DrawArrays { mode, first, count } => {
                push_u32(out, *mode);
                push_i32(out, *first);
                push_i32(out, *count);
            }
            Command::DrawElements {
                mode,
                count,
                ty,
                offset,
            } => {
                push_u32(out, *mode);
                push_i32(out, *count);
                push_u32(out, *ty);
                push_u64(out, *offset);
            }
            Command::Flush | Command::Finish => {}

            Command::GetError => {}
            Command::GetInteger { pname } => push_u32(out, *pname),
        }
    }

    pub fn decode(op: u32, payload: &[u8]) -> Result<Command, DecodeError> {
        use opcode::*;
        let mut r = Reader::new(payload);
        let cmd = match op {
            MAKE_CURRENT => Command::MakeCurrent {
                display: DisplayId(r.read_u64()?),
                draw: SurfaceId(r.read_u64()?),
                read: SurfaceId(r.read_u64()?),
                context: ContextId(r.read_u64()?),
            },
            DESTROY_CONTEXT => Command::DestroyContext {
                display: DisplayId(r.read_u64()?),
                context: ContextId(r.read_u64()?),
            },
            DESTROY_SURFACE => Command::DestroySurface {
                display: DisplayId(r.read_u64()?),
                surface: SurfaceId(r.read_u64()?),
            },
            TERMINATE => Command::Terminate {
                display: DisplayId(r.read_u64()?),
            },
            RELEASE_THREAD => Command::ReleaseThread,
            DISCONNECT => Command::Disconnect,

            ACTIVE_TEXTURE => Command::ActiveTexture {
                unit: r.read_u32()?,
            },
            BIND_BUFFER => Command::BindBuffer {
                target: r.read_u32()?,
                buffer: r.read_u32()?,
            },
            BIND_TEXTURE => Command::BindTexture {
                target: r.read_u32()?,
                texture: r.read_u32()?,
            },
            BIND_FRAMEBUFFER => Command::BindFramebuffer {
                target: r.read_u32()?,
                framebuffer: r.read_u32()?,
            },
            BIND_RENDERBUFFER => Command::BindRenderbuffer {
                target: r.read_u32()?,
                renderbuffer: r.read_u32()?,
            },
            BLEND_COLOR => Command::BlendColor {
                color: [
                    r.read_f32()?,
                    r.read_f32()?,
                    r.read_f32()?,
                    r.read_f32()?,
                ],
            },
            BLEND_EQUATION => Command::BlendEquation {
                mode: r.read_u32()?,
            },
            BLEND_FUNC => Command::BlendFunc {
                src: r.read_u32()?,
                dst: r.read_u32()?,
            },
            CLEAR_COLOR => Command::ClearColor {
                color: [
                    r.read_f32()?,
                    r.read_f32()?,
                    r.read_f32()?,
                    r.read_f32()?,
                ],
            },
            CLEAR_DEPTH => Command::ClearDepth {
                depth: r.read_f32()?,
            },
            CLEAR_STENCIL => Command::ClearStencil {
                stencil: r.read_i32()?,
            },
            COLOR_MASK => Command::ColorMask {
                mask: [
                    r.read_bool()?,
                    r.read_bool()?,
                    r.read_bool()?,
                    r.read_bool()?,
                ],
            },
            CULL_FACE => Command::CullFace {
                mode: r.read_u32()?,
            },
            DEPTH_FUNC => Command::DepthFunc {
                func: r.read_u32()?,
            },
            DEPTH_MASK => Command::DepthMask {
                flag: r.read_bool()?,
            },
            DEPTH_RANGE => Command::DepthRange {
                near: r.read_f32()?,
                far: r.read_f32()?,
            },
            DISABLE => Command::Disable { cap: r.read_u32()? },
            ENABLE => Command::Enable { cap: r.read_u32()? },
            FRONT_FACE => Command::FrontFace {
                mode: r.read_u32()?,
            },
            LINE_WIDTH => Command::LineWidth {
                width: r.read_f32()?,
            },
            PIXEL_STORE => Command::PixelStore {
                pname: r.read_u32()?,
                param: r.read_i32()?,
            },
            POLYGON_OFFSET => Command::PolygonOffset {
                factor: r.read_f32()?,
                units: r.read_f32()?,
            },
            SCISSOR => Command::Scissor {
                x: r.read_i32()?,
                y: r.read_i32()?,
                width: r.read_i32()?,
                height: r.read_i32()?,
            },
            STENCIL_FUNC => Command::StencilFunc {
                func: r.read_u32()?,
                reference: r.read_i32()?,
                mask: r.read_u32()?,
            },
            STENCIL_MASK => Command::StencilMask {
                mask: r.read_u32()?,
            },
            USE_PROGRAM => Command::UseProgram {
                program: r.read_u32()?,
            },
            VIEWPORT => Command::Viewport {
                x: r.read_i32()?,
                y: r.read_i32()?,
                width: r.read_i32()?,
                height: r.read_i32()?,
            },
            VERTEX_ATTRIB_POINTER => Command::VertexAttribPointer {
                index: r.read_u32()?,
                size: r.read_i32()?,
                ty: r.read_u32()?,
                normalized: r.read_bool()?,
                stride: r.read_i32()?,
                offset: r.read_u64()?,
            },
            ENABLE_VERTEX_ATTRIB_ARRAY => Command::EnableVertexAttribArray {
                index: r.read_u32()?,
            },
            DISABLE_VERTEX_ATTRIB_ARRAY => Command::DisableVertexAttribArray {
                index: r.read_u32()?,
            },

            GEN_OBJECTS | DELETE_OBJECTS => {
                let namespace =
                    Namespace::from_u8(r.read_u8()?).ok_or(DecodeError::InvalidEnum)?;
                let count = r.read_u32()? as usize;
                let mut names = Vec::with_capacity(count.min(1024));
                for _ in 0..count {
                    names.push(r.read_u32()?);
                }
                if op == GEN_OBJECTS {
                    Command::GenObjects { namespace, names }
                } else {
                    Command::DeleteObjects { namespace, names }
                }
            }
            CREATE_SHADER => Command::CreateShader {
                kind: r.read_u32()?,
            },
            CREATE_PROGRAM => Command::CreateProgram,
            DELETE_SHADER => Command::DeleteShader {
                shader: r.read_u32()?,
            },
            DELETE_PROGRAM => Command::DeleteProgram {
                program: r.read_u32()?,
            },
            SHADER_SOURCE => Command::ShaderSource {
                shader: r.read_u32()?,
                source: r.read_string()?,
            },
            COMPILE_SHADER => Command::CompileShader {
                shader: r.read_u32()?,
            },
            ATTACH_SHADER => Command::AttachShader {
                program: r.read_u32()?,
                shader: r.read_u32()?,
            },
            LINK_PROGRAM => Command::LinkProgram {
                program: r.read_u32()?,
            },

            BUFFER_DATA => Command::BufferData {
                target: r.read_u32()?,
                usage: r.read_u32()?,
                data: r.read_blob()?,
            },
            BUFFER_SUB_DATA => Command::BufferSubData {
                target: r.read_u32()?,
                offset: r.read_u64()?,
                data: r.read_blob()?,
            },
            TEX_IMAGE_2D => {
                let target = r.read_u32()?;
                let level = r.read_i32()?;
                let internal_format = r.read_u32()?;
                let width = r.read_i32()?;
                let height = r.read_i32()?;
                let border = r.read_i32()?;
                let format = r.read_u32()?;
                let ty = r.read_u32()?;
                let pixels = if r.read_bool()? {
                    Some(r.read_blob()?)
                } else {
                    None
                };
                Command::TexImage2d {
                    target,
                    level,
                    internal_format,
                    width,
                    height,
                    border,
                    format,
                    ty,
                    pixels,
                }
            }
            TEX_SUB_IMAGE_2D => Command::TexSubImage2d {
                target: r.read_u32()?,
                level: r.read_i32()?,
                xoffset: r.read_i32()?,
                yoffset: r.read_i32()?,
                width: r.read_i32()?,
                height: r.read_i32()?,
                format: r.read_u32()?,
                ty: r.read_u32()?,
                pixels: r.read_blob()?,
            },

            CLEAR => Command::Clear {
                mask: r.read_u32()?,
            },
            DRAW_ARRAYS => Command::DrawArrays {
                mode: r.read_u32()?,
                first: r.read_i32()?,
                count: r.read_i32()?,
            },
            DRAW_ELEMENTS => Command::DrawElements {
                mode: r.read_u32()?,
                count: r.read_i32()?,
                ty: r.read_u32()?,
                offset: r.read_u64()?,
            },
            FLUSH => Command::Flush,
            FINISH => Command::Finish,

            GET_ERROR => Command::GetError,
            GET_INTEGER => Command::GetInteger {
                pname: r.read_u32()?,
            },

            other => return Err(DecodeError::UnknownOpcode(other)),
        };
        if r.remaining() != 0 {
            // Extra bytes are considered a format violation.
            return Err(DecodeError::TrailingBytes);
        }
        Ok(cmd)
    }
}
