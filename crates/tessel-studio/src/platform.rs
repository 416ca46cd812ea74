//! winit window events → imgui io.

use imgui::{Io, Key, MouseButton};
use winit::event::{ElementState, MouseScrollDelta, WindowEvent};
use winit::keyboard::{Key as WinitKey, NamedKey};

/// Pixels per wheel "line" for touchpads that report pixel deltas.
const PIXELS_PER_LINE: f32 = 20.0;

/// Feeds one window event to imgui. `scale_factor` converts physical to logical pixels.
pub fn handle_event(io: &mut Io, scale_factor: f32, event: &WindowEvent) {
    match event {
        WindowEvent::CursorMoved { position, .. } => {
            io.add_mouse_pos_event([
                position.x as f32 / scale_factor,
                position.y as f32 / scale_factor,
            ]);
        }
        WindowEvent::CursorLeft { .. } => {
            io.add_mouse_pos_event([-f32::MAX, -f32::MAX]);
        }
        WindowEvent::MouseInput { state, button, .. } => {
            if let Some(button) = map_mouse_button(*button) {
                io.add_mouse_button_event(button, *state == ElementState::Pressed);
            }
        }
        WindowEvent::MouseWheel { delta, .. } => {
            let [h, v] = match delta {
                MouseScrollDelta::LineDelta(h, v) => [*h, *v],
                MouseScrollDelta::PixelDelta(pos) => [
                    pos.x as f32 / PIXELS_PER_LINE,
                    pos.y as f32 / PIXELS_PER_LINE,
                ],
            };
            io.add_mouse_wheel_event([h, v]);
        }
        WindowEvent::ModifiersChanged(modifiers) => {
            let state = modifiers.state();
            io.add_key_event(Key::ModCtrl, state.control_key());
            io.add_key_event(Key::ModShift, state.shift_key());
            io.add_key_event(Key::ModAlt, state.alt_key());
            io.add_key_event(Key::ModSuper, state.super_key());
        }
        WindowEvent::KeyboardInput { event, .. } => {
            let pressed = event.state == ElementState::Pressed;
            if let Some(key) = map_key(&event.logical_key) {
                io.add_key_event(key, pressed);
            }
            if pressed {
                if let Some(text) = &event.text {
                    text.chars()
                        .filter(|c| !c.is_control())
                        .for_each(|c| io.add_input_character(c));
                }
            }
        }
        _ => {}
    }
}

pub fn map_mouse_button(button: winit::event::MouseButton) -> Option<MouseButton> {
    use winit::event::MouseButton as W;
    match button {
        W::Left => Some(MouseButton::Left),
        W::Right => Some(MouseButton::Right),
        W::Middle => Some(MouseButton::Middle),
        W::Back => Some(MouseButton::Extra1),
        W::Forward => Some(MouseButton::Extra2),
        W::Other(_) => None,
    }
}

/// Keys imgui widgets react to; everything else arrives as text.
pub fn map_key(key: &WinitKey) -> Option<Key> {
    match key {
        WinitKey::Named(named) => Some(match named {
            NamedKey::Tab => Key::Tab,
            NamedKey::ArrowLeft => Key::LeftArrow,
            NamedKey::ArrowRight => Key::RightArrow,
            NamedKey::ArrowUp => Key::UpArrow,
            NamedKey::ArrowDown => Key::DownArrow,
            NamedKey::PageUp => Key::PageUp,
            NamedKey::PageDown => Key::PageDown,
            NamedKey::Home => Key::Home,
            NamedKey::End => Key::End,
            NamedKey::Insert => Key::Insert,
            NamedKey::Delete => Key::Delete,
            NamedKey::Backspace => Key::Backspace,
            NamedKey::Space => Key::Space,
            NamedKey::Enter => Key::Enter,
            NamedKey::Escape => Key::Escape,
            _ => return None,
        }),
        WinitKey::Character(s) => match s.as_str() {
            "a" | "A" => Some(Key::A),
            "c" | "C" => Some(Key::C),
            "v" | "V" => Some(Key::V),
            "x" | "X" => Some(Key::X),
            "y" | "Y" => Some(Key::Y),
            "z" | "Z" => Some(Key::Z),
            _ => None,
        },
        _ => None,
    }
}
