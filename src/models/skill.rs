use serde::Serialize;

/// Static catalog entry for a soft skill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Skill {
    pub code: &'static str,
    pub title: &'static str,
    pub icon: &'static str,
    #[serde(rename = "desc")]
    pub description: &'static str,
}

pub const SKILLS: &[Skill] = &[
    Skill {
        code: "communication",
        title: "Communication",
        icon: "🗣️",
        description: "Express ideas clearly and listen actively.",
    },
    Skill {
        code: "collaboration",
        title: "Collaboration",
        icon: "🤝",
        description: "Work effectively in teams to reach goals.",
    },
    Skill {
        code: "critical-thinking",
        title: "Critical Thinking",
        icon: "🧠",
        description: "Analyze, evaluate, and make reasoned decisions.",
    },
    Skill {
        code: "creativity",
        title: "Creativity",
        icon: "🎨",
        description: "Generate original ideas and solutions.",
    },
    Skill {
        code: "problem-solving",
        title: "Problem Solving",
        icon: "🧩",
        description: "Identify issues and design effective fixes.",
    },
    Skill {
        code: "adaptability",
        title: "Adaptability",
        icon: "🔄",
        description: "Adapt and thrive in changing environments.",
    },
    Skill {
        code: "digital-literacy",
        title: "Digital Literacy",
        icon: "💻",
        description: "Navigate and use digital tools effectively.",
    },
    Skill {
        code: "initiative",
        title: "Initiative",
        icon: "🚀",
        description: "Take proactive steps and show self-direction.",
    },
    Skill {
        code: "leadership",
        title: "Leadership",
        icon: "👥",
        description: "Guide and inspire teams to achieve goals.",
    },
    Skill {
        code: "media-literacy",
        title: "Media Literacy",
        icon: "📱",
        description: "Analyze and create media content critically.",
    },
];

/// Look up a catalog skill by its code
pub fn find_skill(code: &str) -> Option<&'static Skill> {
    SKILLS.iter().find(|skill| skill.code == code)
}

/// Display title for a skill code, falling back to the code itself
pub fn skill_title(code: &str) -> String {
    find_skill(code)
        .map(|skill| skill.title.to_string())
        .unwrap_or_else(|| code.to_string())
}
