//! # System Constants
//!
//! Event codes, well-known module and sniffer names, exit codes and the
//! archive layout conventions shared by the scheduler, the classifier and the
//! deployer.

/// Event codes published on the [`EventBus`](crate::events::EventBus)
pub mod events {
    // Deployment lifecycle events (payload: the affected deployment)
    pub const DEPLOYMENT_REQUESTED: &str = "deployment.requested";
    pub const PRE_DEPLOYMENT: &str = "deployment.pre";
    pub const POST_DEPLOYMENT: &str = "deployment.post";
    pub const UNDEPLOYMENT: &str = "deployment.undeploy";
    pub const VERIFY_DEPLOYMENT: &str = "deployment.verify";

    // Runtime events (payload: the active runtime configuration)
    pub const CONFIGURATION_UPDATE: &str = "configuration.update";
}

/// Names of the modules the runtime knows about by convention
pub mod modules {
    pub const CONFIGURATION: &str = "config";
    pub const LOGGING: &str = "logging";
    pub const STATIC_CONTENT: &str = "static-content";

    /// Always started first, sequentially, in this order.
    pub const BOOTSTRAP: [&str; 2] = [CONFIGURATION, LOGGING];

    pub fn is_bootstrap(name: &str) -> bool {
        BOOTSTRAP.contains(&name)
    }
}

/// Sniffer type identifiers used by modules to declare their detector
pub mod sniffers {
    pub const SERVLET: &str = "servlet";
    pub const REST: &str = "rest";
    pub const HTML: &str = "html";
}

/// Keys the built-in sniffers and modules write into deployment metadata
pub mod metadata {
    pub const SERVLET_DESCRIPTOR: &str = "servlet.descriptor";
    pub const SERVLET_VERSION: &str = "servlet.version";
    pub const SERVLET_COMPONENTS: &str = "servlet.components";
    pub const REST_APPLICATION_CLASS: &str = "rest.application-class";
    pub const REST_APPLICATION_PATH: &str = "rest.application-path";
    pub const REST_RESOURCES: &str = "rest.resources";
    pub const HTML_WELCOME_FILE: &str = "html.welcome-file";
    pub const HTML_PAGES: &str = "html.pages";
    pub const STATIC_CONTENT_PAGES: &str = "static-content.pages";
}

/// Process exit codes reported by the `harbor` binary
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const RUNTIME_ERROR: i32 = 1;
    pub const CONFIGURATION_ERROR: i32 = 2;
    pub const STARTUP_ABORTED: i32 = 3;
}

/// Web archive layout conventions
pub mod archive {
    pub const WAR_EXTENSION: &str = ".war";
    pub const ROOT_CONTEXT: &str = "/";
    pub const WEB_INF: &str = "WEB-INF/";
    pub const WEB_INF_CLASSES: &str = "WEB-INF/classes/";
    pub const WEB_INF_LIB: &str = "WEB-INF/lib/";
    pub const META_INF: &str = "META-INF/";
    pub const WEB_XML: &str = "WEB-INF/web.xml";
    pub const CLASS_EXTENSION: &str = ".class";
    pub const JAR_EXTENSION: &str = ".jar";

    /// Descriptor files larger than this are listed but not read.
    pub const MAX_DESCRIPTOR_BYTES: u64 = 1024 * 1024;
}

/// Defaults applied when configuration leaves a value unset
pub mod defaults {
    pub const ENVIRONMENT: &str = "development";
    pub const WAVE_THREAD_PREFIX: &str = "harbor-module";
    pub const CONFIG_FILE_STEM: &str = "harbor";
    pub const ENV_PREFIX: &str = "HARBOR";
}
