pub mod cost_sampler_service;
