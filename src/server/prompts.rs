// Copyright (c) 2025-2026 the ctxpack contributors
// SPDX-License-Identifier: Apache-2.0

//! Prompt templates for the analysis tools.

pub fn architecture(focus: &str) -> String {
    format!(
        "Provide a comprehensive {focus} analysis of this codebase. Include:

1. **Overall Architecture & Design Patterns**
2. **Key Components & Their Relationships**
3. **Data Flow & Dependencies**
4. **Technology Stack & Framework Usage**
5. **Code Organization & Structure Quality**
6. **Notable Design Decisions**

Be specific and reference actual files, functions, and code patterns you observe."
    )
}

pub fn semantic_search(query: &str) -> String {
    format!(
        "Perform a semantic search for: \"{query}\"

Provide:
1. **Exact file locations** where this functionality exists
2. **Relevant code snippets** with line context
3. **Related functions/classes** that work together
4. **Usage patterns** across the codebase
5. **Dependencies** and connections to other parts

Focus on semantic meaning, not just keyword matching."
    )
}

pub fn improvements(area: &str) -> String {
    format!(
        "Analyze the codebase and suggest specific improvements for {area}:

Provide:
1. **Specific Issues** with file/line references
2. **Concrete Solutions** with code examples
3. **Priority Ranking** (High/Medium/Low)
4. **Implementation Steps** for each suggestion
5. **Potential Risks** of each change

Focus on actionable improvements with clear benefits."
    )
}

pub fn codeflow(functionality: &str) -> String {
    format!(
        "Trace and explain how this functionality works: \"{functionality}\"

Provide:
1. **Entry Points** - Where this functionality starts
2. **Code Flow** - Step-by-step execution path across files
3. **Key Functions/Classes** - Main components involved
4. **Data Transformations** - How data flows and changes
5. **External Dependencies** - APIs, databases, etc.
6. **Visual Flow** - ASCII diagram if helpful

Reference specific files and line numbers."
    )
}

pub const SUMMARY: &str = "Provide a comprehensive summary of this entire codebase:

1. **Project Purpose** - What does this software do?
2. **Architecture Overview** - How is it structured?
3. **Key Features** - Main functionality areas
4. **Technology Stack** - Languages, frameworks, tools
5. **Code Quality Assessment** - Strengths and areas for improvement
6. **Development Insights** - Patterns, conventions, notable aspects

Make it accessible for both technical and non-technical stakeholders.";
