// ABOUTME: Request-processing middleware module
// ABOUTME: Hosts the mobile authorization interceptor
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Transit Platform

//! Request middleware

pub mod authorize;

pub use authorize::authorize_interceptor;
