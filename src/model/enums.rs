//! Categorical values a profile document may pick from.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Kinds of work experience.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Experience {
    Volunteer,
    Intern,
    Trainee,
    Employee,
}

/// Orientation of a school the person attended.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum School {
    It,
    Math,
    NonIt,
}

/// Skills and technologies.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Skill {
    // General areas
    Backend,
    Frontend,
    Fullstack,
    Mobile,
    Testing,

    // Mobile
    Android,
    Flutter,
    Kotlin,
    Swift,

    // Backend
    Apachespark,
    Csharp,
    Django,
    Fastapi,
    Java,
    Kafka,
    Kubernetes,
    Laravel,
    Php,
    Postgresql,
    Python,
    Rabbitmq,
    Redis,
    Springboot,
    Sql,
    Wpf,

    // Low-level
    Arduino,
    C,
    Cpp,
    Rust,
    Zig,

    // GIS
    Postgis,

    // Data
    Pandas,
    Matplotlib,
    Opencv,
    Tensorflow,

    // Frontend
    Angular,
    Css,
    Html,
    Javascript,
    Jquery,
    React,
    Scss,
    Typescript,
    Vue,

    // Tools
    Docker,
    Git,
}
