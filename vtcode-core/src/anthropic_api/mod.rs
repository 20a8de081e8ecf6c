//! Anthropic API compatibility layer for VT Code
//! 
//! Provides compatibility with the Anthropic Messages API to help connect existing 
//! applications to VT Code, including tools like Claude Code.

pub mod server;