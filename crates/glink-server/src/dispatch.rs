//! Decode-and-invoke loop for one transport ring.

use crate::driver::GlDriver;
use glink_protocol::{Command, DecodeError, Namespace, Reply};
use glink_ring::RingConsumer;
use glink_state::{ContextRegistry, NameTable};
use tracing::{trace, warn};

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The record could not be decoded. Indicates transport corruption, not
    /// an application error; the record's token is still completed so the
    /// producer cannot wedge on it.
    #[error("failed to decode record: {0}")]
    Decode(#[from] DecodeError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// One record was executed.
    Processed,
    /// Nothing pending.
    Idle,
    /// The producer sent its disconnect record.
    Disconnected,
}

/// Executes records from one producer against the real driver.
pub struct Dispatcher<D> {
    consumer: RingConsumer,
    driver: D,
    registry: ContextRegistry<()>,
    names: NameTable,
}

impl<D: GlDriver> Dispatcher<D> {
    pub fn new(consumer: RingConsumer, driver: D) -> Self {
        Self {
            consumer,
            driver,
            registry: ContextRegistry::new(),
            names: NameTable::new(),
        }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Number of context records tracked on the executing side.
    pub fn tracked_contexts(&self) -> usize {
        self.registry.len()
    }

    /// Virtual-to-real translation state, for inspection.
    pub fn resolve_name(&self, namespace: Namespace, virtual_name: u32) -> Option<u32> {
        self.names.resolve(namespace, virtual_name)
    }

    /// Execute the next pending record, if any.
    pub fn poll(&mut self) -> Result<Control, DispatchError> {
        let Some((opcode, token, payload)) = self.consumer.poll_owned() else {
            return Ok(Control::Idle);
        };

        let cmd = match Command::decode(opcode, &payload) {
            Ok(cmd) => cmd,
            Err(err) => {
                warn!(%err, opcode, "dropping undecodable record");
                self.consumer.finish(token);
                return Err(err.into());
            }
        };
        trace!(opcode, token, "executing record");

        let disconnect = matches!(cmd, Command::Disconnect);
        // The reply (if any) must be stored before the token completes, so a
        // blocked synchronous caller always finds it on wake-up.
        match self.execute(cmd) {
            Some(reply) => self.consumer.finish_with_reply(token, reply.encode()),
            None => self.consumer.finish(token),
        }

        Ok(if disconnect {
            Control::Disconnected
        } else {
            Control::Processed
        })
    }

    /// Drain records until the producer disconnects.
    pub fn run(&mut self) -> Result<(), DispatchError> {
        loop {
            match self.poll()? {
                Control::Processed => {}
                Control::Idle => std::thread::yield_now(),
                Control::Disconnected => return Ok(()),
            }
        }
    }

    /// Invoke the real driver for one decoded record. Returns the reply for
    /// synchronous opcodes.
    ///
    /// Lifecycle records update the executing-side registry only after the
    /// driver reports success, keeping both sides' lifecycle decisions in
    /// lockstep.
    fn execute(&mut self, cmd: Command) -> Option<Reply> {
        match cmd {
            Command::MakeCurrent {
                display,
                draw,
                read,
                context,
            } => {
                let ok = self.driver.make_current(display, draw, read, context);
                if ok {
                    self.registry.make_current(display, draw, read, context);
                }
                Some(Reply::Bool(ok))
            }
            Command::DestroyContext { display, context } => {
                let ok = self.driver.destroy_context(display, context);
                if ok {
                    self.registry.destroy_context(display, context);
                }
                Some(Reply::Bool(ok))
            }
            Command::DestroySurface { display, surface } => {
                let ok = self.driver.destroy_surface(display, surface);
                if ok {
                    self.registry.destroy_surface(display, surface);
                }
                Some(Reply::Bool(ok))
            }
            Command::Terminate { display } => {
                let ok = self.driver.terminate(display);
                if ok {
                    self.registry.terminate(display);
                }
                Some(Reply::Bool(ok))
            }
            Command::ReleaseThread => {
                let ok = self.driver.release_thread();
                if ok {
                    self.registry.release();
                }
                Some(Reply::Bool(ok))
            }
            Command::Disconnect => None,

            Command::GenObjects { namespace, names } => {
                let real = self.driver.gen_objects(namespace, names.len());
                debug_assert_eq!(real.len(), names.len());
                for (&virtual_name, real_name) in names.iter().zip(real) {
                    self.names.insert(namespace, virtual_name, real_name);
                }
                Some(Reply::Unit)
            }
            Command::DeleteObjects { namespace, names } => {
                let real: Vec<u32> = names
                    .iter()
                    .filter_map(|&v| self.names.remove(namespace, v))
                    .collect();
                if !real.is_empty() {
                    self.driver.delete_objects(namespace, &real);
                }
                None
            }
            Command::CreateShader { kind } => Some(Reply::Uint(self.driver.create_shader(kind))),
            Command::CreateProgram => Some(Reply::Uint(self.driver.create_program())),
            Command::DeleteShader { shader } => {
                self.driver.delete_shader(shader);
                None
            }
            Command::DeleteProgram { program } => {
                self.driver.delete_program(program);
                None
            }
            Command::ShaderSource { shader, source } => {
                self.driver.shader_source(shader, &source);
                None
            }
            Command::CompileShader { shader } => {
                self.driver.compile_shader(shader);
                None
            }
            Command::AttachShader { program, shader } => {
                self.driver.attach_shader(program, shader);
                None
            }
            Command::LinkProgram { program } => {
                self.driver.link_program(program);
                None
            }

            Command::BindBuffer { target, buffer } => {
                let real = self.resolve_or_create(Namespace::Buffer, buffer);
                self.driver.bind_buffer(target, real);
                None
            }
            Command::BindTexture { target, texture } => {
                let real = self.resolve_or_create(Namespace::Texture, texture);
                self.driver.bind_texture(target, real);
                None
            }
            Command::BindFramebuffer {
                target,
                framebuffer,
            } => {
                let real = self.resolve_or_create(Namespace::Framebuffer, framebuffer);
                self.driver.bind_framebuffer(target, real);
                None
            }
            Command::BindRenderbuffer {
                target,
                renderbuffer,
            } => {
                let real = self.resolve_or_create(Namespace::Renderbuffer, renderbuffer);
                self.driver.bind_renderbuffer(target, real);
                None
            }

            Command::ActiveTexture { unit } => {
                self.driver.active_texture(unit);
                None
            }
            Command::BlendColor { color } => {
                self.driver.blend_color(color);
                None
            }
            Command::BlendEquation { mode } => {
                self.driver.blend_equation(mode);
                None
            }
            Command::BlendFunc { src, dst } => {
                self.driver.blend_func(src, dst);
                None
            }
            Command::ClearColor { color } => {
                self.driver.clear_color(color);
                None
            }
            Command::ClearDepth { depth } => {
                self.driver.clear_depthf(depth);
                None
            }
            Command::ClearStencil { stencil } => {
                self.driver.clear_stencil(stencil);
                None
            }
            Command::ColorMask { mask } => {
                self.driver.color_mask(mask);
                None
            }
            Command::CullFace { mode } => {
                self.driver.cull_face(mode);
                None
            }
            Command::DepthFunc { func } => {
                self.driver.depth_func(func);
                None
            }
            Command::DepthMask { flag } => {
                self.driver.depth_mask(flag);
                None
            }
            Command::DepthRange { near, far } => {
                self.driver.depth_rangef(near, far);
                None
            }
            Command::Enable { cap } => {
                self.driver.set_capability(cap, true);
                None
            }
            Command::Disable { cap } => {
                self.driver.set_capability(cap, false);
                None
            }
            Command::FrontFace { mode } => {
                self.driver.front_face(mode);
                None
            }
            Command::LineWidth { width } => {
                self.driver.line_width(width);
                None
            }
            Command::PixelStore { pname, param } => {
                self.driver.pixel_storei(pname, param);
                None
            }
            Command::PolygonOffset { factor, units } => {
                self.driver.polygon_offset(factor, units);
                None
            }
            Command::Scissor {
                x,
                y,
                width,
                height,
            } => {
                self.driver.scissor(x, y, width, height);
                None
            }
            Command::StencilFunc {
                func,
                reference,
                mask,
            } => {
                self.driver.stencil_func(func, reference, mask);
                None
            }
            Command::StencilMask { mask } => {
                self.driver.stencil_mask(mask);
                None
            }
            Command::UseProgram { program } => {
                self.driver.use_program(program);
                None
            }
            Command::Viewport {
                x,
                y,
                width,
                height,
            } => {
                self.driver.viewport(x, y, width, height);
                None
            }
            Command::VertexAttribPointer {
                index,
                size,
                ty,
                normalized,
                stride,
                offset,
            } => {
                self.driver
                    .vertex_attrib_pointer(index, size, ty, normalized, stride, offset);
                None
            }
            Command::EnableVertexAttribArray { index } => {
                self.driver.enable_vertex_attrib_array(index);
                None
            }
            Command::DisableVertexAttribArray { index } => {
                self.driver.disable_vertex_attrib_array(index);
                None
            }

            Command::BufferData {
                target,
                usage,
                data,
            } => {
                self.driver.buffer_data(target, &data, usage);
                None
            }
            Command::BufferSubData {
                target,
                offset,
                data,
            } => {
                self.driver.buffer_sub_data(target, offset, &data);
                None
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
                self.driver.tex_image_2d(
                    target,
                    level,
                    internal_format,
                    width,
                    height,
                    border,
                    format,
                    ty,
                    pixels.as_deref(),
                );
                None
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
                self.driver.tex_sub_image_2d(
                    target, level, xoffset, yoffset, width, height, format, ty, &pixels,
                );
                None
            }

            Command::Clear { mask } => {
                self.driver.clear(mask);
                None
            }
            Command::DrawArrays { mode, first, count } => {
                self.driver.draw_arrays(mode, first, count);
                None
            }
            Command::DrawElements {
                mode,
                count,
                ty,
                offset,
            } => {
                self.driver.draw_elements(mode, count, ty, offset);
                None
            }
            Command::Flush => {
                self.driver.flush();
                None
            }
            Command::Finish => {
                self.driver.finish();
                Some(Reply::Unit)
            }

            Command::GetError => Some(Reply::Uint(self.driver.get_error())),
            Command::GetInteger { pname } => Some(Reply::Ints(self.driver.get_integerv(pname))),
        }
    }

    /// Translate a virtual name, lazily creating the object for names that
    /// were never generated: GL ES permits binding an unused name, which
    /// creates it.
    fn resolve_or_create(&mut self, namespace: Namespace, virtual_name: u32) -> u32 {
        if virtual_name == 0 {
            return 0;
        }
        if let Some(real) = self.names.resolve(namespace, virtual_name) {
            return real;
        }
        let real = self
            .driver
            .gen_objects(namespace, 1)
            .first()
            .copied()
            .unwrap_or(0);
        trace!(?namespace, virtual_name, real, "created object on first bind");
        self.names.insert(namespace, virtual_name, real);
        real
    }
}
