// Application layer - The panel request pipeline
pub mod args;
pub mod builder;
pub mod catalog;
pub mod dispatcher;
pub mod renderer;
pub mod resolver;
pub mod template;
