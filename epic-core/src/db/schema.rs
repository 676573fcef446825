pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    name TEXT,
    organization_id TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS brands (
    organization_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS flywheel_progress (
    user_id TEXT PRIMARY KEY,
    overall_progress INTEGER NOT NULL DEFAULT 0 CHECK (overall_progress BETWEEN 0 AND 100),
    flywheel_active INTEGER NOT NULL DEFAULT 0,
    activated_at TEXT,
    last_active_phase TEXT CHECK (last_active_phase IN ('UNDERSTAND', 'CREATE', 'DISTRIBUTE', 'LEARN', 'AUTOMATE')),
    last_active_at TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS flywheel_phases (
    user_id TEXT NOT NULL REFERENCES flywheel_progress(user_id) ON DELETE CASCADE,
    phase TEXT NOT NULL CHECK (phase IN ('UNDERSTAND', 'CREATE', 'DISTRIBUTE', 'LEARN', 'AUTOMATE')),
    status TEXT NOT NULL DEFAULT 'NOT_STARTED' CHECK (status IN ('NOT_STARTED', 'IN_PROGRESS', 'COMPLETED')),
    step INTEGER NOT NULL DEFAULT 0 CHECK (step >= 0),
    data JSON NOT NULL DEFAULT '{}',
    updated_at TEXT NOT NULL,
    PRIMARY KEY (user_id, phase)
);

CREATE TABLE IF NOT EXISTS autopilot_settings (
    organization_id TEXT PRIMARY KEY,
    enabled INTEGER NOT NULL DEFAULT 0,
    on_lead_converted INTEGER NOT NULL DEFAULT 0,
    on_five_star_call INTEGER NOT NULL DEFAULT 0,
    on_weekly_schedule INTEGER NOT NULL DEFAULT 0,
    approval_mode TEXT NOT NULL DEFAULT 'REQUIRES_APPROVAL' CHECK (approval_mode IN ('AUTO_POST', 'REQUIRES_APPROVAL')),
    default_platforms JSON NOT NULL DEFAULT '[]',
    max_posts_per_day INTEGER NOT NULL DEFAULT 3 CHECK (max_posts_per_day >= 0),
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS social_suggestions (
    id TEXT PRIMARY KEY,
    organization_id TEXT NOT NULL,
    trigger_type TEXT NOT NULL CHECK (trigger_type IN ('LEAD_CONVERTED', 'FIVE_STAR_CALL', 'WEEKLY_CONTENT', 'MANUAL')),
    content TEXT NOT NULL,
    image_url TEXT,
    suggested_platforms JSON NOT NULL DEFAULT '[]',
    post_platforms JSON NOT NULL DEFAULT '[]',
    status TEXT NOT NULL DEFAULT 'PENDING' CHECK (status IN ('PENDING', 'APPROVED', 'POSTED', 'DISMISSED')),
    post_id TEXT,
    posted_at TEXT,
    dismissed_at TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS post_log (
    id TEXT PRIMARY KEY,
    organization_id TEXT NOT NULL,
    suggestion_id TEXT NOT NULL REFERENCES social_suggestions(id) ON DELETE CASCADE,
    post_id TEXT NOT NULL,
    platforms JSON NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_users_organization ON users(organization_id);
CREATE INDEX IF NOT EXISTS idx_suggestions_organization ON social_suggestions(organization_id, created_at);
CREATE INDEX IF NOT EXISTS idx_post_log_organization ON post_log(organization_id, created_at);
"#;
