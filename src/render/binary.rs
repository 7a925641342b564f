//! Binary serialization for recorded frames
//!
//! This module packs a frame's draw commands into one little-endian buffer
//! for the webview, which uploads the float runs straight into GPU buffers.
//!
//! Format: [magic "CHORFRM1"][command_count: u32][command]...
//! Every command starts with [tag: u32]. All fields are 4-byte aligned so
//! Float32Array/Uint32Array views can be taken at any field offset.
//!
//! | tag | command | payload |
//! |-----|---------|---------|
//! | 1 | begin | width u32, height u32, clear 4 x f32 |
//! | 2 | transform | 9 x f32 |
//! | 3 | fill | code (u32 length + bytes + padding), color 4 x f32, float_count u32, floats |
//! | 4 | stroke | color 4 x f32, width f32, float_count u32, floats |
//! | 5 | end | (none) |

use super::backend::DrawCommand;

pub const FRAME_MAGIC: &[u8; 8] = b"CHORFRM1";

const TAG_BEGIN: u32 = 1;
const TAG_TRANSFORM: u32 = 2;
const TAG_FILL: u32 = 3;
const TAG_STROKE: u32 = 4;
const TAG_END: u32 = 5;

pub fn frame_to_bytes(commands: &[DrawCommand]) -> Vec<u8> {
    let mut buffer = Vec::new();

    // Magic header (8 bytes - already aligned)
    buffer.extend_from_slice(FRAME_MAGIC);
    buffer.extend_from_slice(&(commands.len() as u32).to_le_bytes());

    for command in commands {
        match command {
            DrawCommand::Begin { width, height, clear } => {
                put_u32(&mut buffer, TAG_BEGIN);
                put_u32(&mut buffer, *width);
                put_u32(&mut buffer, *height);
                put_floats(&mut buffer, clear);
            }
            DrawCommand::SetTransform(matrix) => {
                put_u32(&mut buffer, TAG_TRANSFORM);
                put_floats(&mut buffer, matrix);
            }
            DrawCommand::Fill { code, vertices, color } => {
                put_u32(&mut buffer, TAG_FILL);
                put_string(&mut buffer, code);
                put_floats(&mut buffer, color);
                put_u32(&mut buffer, vertices.len() as u32);
                put_floats(&mut buffer, vertices);
            }
            DrawCommand::Stroke { segments, color, width } => {
                put_u32(&mut buffer, TAG_STROKE);
                put_floats(&mut buffer, color);
                put_floats(&mut buffer, &[*width]);
                put_u32(&mut buffer, segments.len() as u32);
                put_floats(&mut buffer, segments);
            }
            DrawCommand::End => put_u32(&mut buffer, TAG_END),
        }
    }

    buffer
}

fn put_u32(buffer: &mut Vec<u8>, value: u32) {
    buffer.extend_from_slice(&value.to_le_bytes());
}

fn put_floats(buffer: &mut Vec<u8>, values: &[f32]) {
    for &f in values {
        buffer.extend_from_slice(&f.to_le_bytes());
    }
}

/// Length-prefixed string padded to a 4-byte boundary
fn put_string(buffer: &mut Vec<u8>, s: &str) {
    let bytes = s.as_bytes();
    put_u32(buffer, bytes.len() as u32);
    buffer.extend_from_slice(bytes);
    let padding = (4 - (bytes.len() % 4)) % 4;
    buffer.resize(buffer.len() + padding, 0);
}
