pub mod shared {
    pub mod config;
    pub mod constants;
    pub mod frame;
    pub mod model_resolver;
    pub mod region;
}

pub mod geometry {
    pub mod rounded_ellipse;
    pub mod target_box;
}

pub mod compositing {
    pub mod domain {
        pub mod scene_compositor;
    }
    pub mod infrastructure;
}

pub mod detection {
    pub mod domain {
        pub mod face_detector;
        pub mod face_locator;
        pub mod face_selection;
        pub mod landmark_bounds;
        pub mod landmark_tracker;
    }
    pub mod infrastructure;
}

pub mod camera {
    pub mod domain {
        pub mod camera;
    }
    pub mod infrastructure;
}

pub mod capture {
    pub mod snapshot;
    pub mod snapshot_file_writer;
}

pub mod render {
    pub mod frame_clock;
    pub mod render_loop;
    pub mod session;
    pub mod status;
    pub mod status_reporter;
}
